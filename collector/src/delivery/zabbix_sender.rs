use super::{
    TrapperLine,
    TrapperSender,
};
use crate::error::DeliveryError;
use netcli_collector_config::SenderConfig;
use std::{
    io::{
        Read,
        Write,
    },
    path::PathBuf,
    process::{
        Child,
        Command,
        Stdio,
    },
    thread,
    time::{
        Duration,
        Instant,
    },
};

const SENDER_BINARY: &str = "zabbix_sender";
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs the local `zabbix_sender` utility, one process per call.
#[derive(Debug, Clone)]
pub struct ZabbixSender {
    binary: PathBuf,
    server: String,
    port: Option<u16>,
}

impl ZabbixSender {
    pub fn new(binary: impl Into<PathBuf>, server: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            binary: binary.into(),
            server: server.into(),
            port,
        }
    }

    /// Uses the configured binary, or looks `zabbix_sender` up on `PATH`.
    pub fn from_config(config: &SenderConfig) -> Result<Self, DeliveryError> {
        let binary = match &config.binary {
            Some(binary) => which::which(binary).map_err(|_| DeliveryError::SenderNotFound(binary.display().to_string()))?,
            None => which::which(SENDER_BINARY).map_err(|_| DeliveryError::SenderNotFound(SENDER_BINARY.to_string()))?,
        };
        debug!(binary = ?binary, server = %config.server, "using trapper sender");
        Ok(Self::new(binary, config.server.as_str(), config.port))
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.binary);
        command.arg("-z").arg(&self.server);
        if let Some(port) = self.port {
            command.arg("-p").arg(port.to_string());
        }
        command
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        command
    }
}

impl TrapperSender for ZabbixSender {
    fn send_item(&self, line: &TrapperLine, timeout: Duration) -> Result<(), DeliveryError> {
        let mut command = self.command();
        command
            .arg("-s")
            .arg(&line.target)
            .arg("-k")
            .arg(&line.key)
            .arg("-o")
            .arg(&line.value)
            .stdin(Stdio::null());
        let child = command.spawn().map_err(DeliveryError::Spawn)?;
        wait(child, timeout)
    }

    fn send_batch(&self, lines: &[TrapperLine], timeout: Duration) -> Result<(), DeliveryError> {
        let mut input = String::new();
        for line in lines {
            input.push_str(&line.to_string());
            input.push('\n');
        }

        let mut command = self.command();
        command.arg("-i").arg("-").stdin(Stdio::piped());
        let child = command.spawn().map_err(DeliveryError::Spawn)?;
        wait_with_input(child, input, timeout)
    }
}

/// Feeds `input` to the child's stdin from a helper thread so that a sender which stops
/// reading cannot hold the caller past `timeout`.
fn wait_with_input(mut child: Child, input: String, timeout: Duration) -> Result<(), DeliveryError> {
    if let Some(mut stdin) = child.stdin.take() {
        thread::spawn(move || {
            // Fails once the sender exits or is killed. Its status tells why.
            if let Err(e) = stdin.write_all(input.as_bytes()) {
                debug!(error = %e, "sender closed its input");
            }
        });
    }
    wait(child, timeout)
}

/// Waits for `child` for at most `timeout`, killing it on expiry. Stderr is drained while
/// waiting.
fn wait(mut child: Child, timeout: Duration) -> Result<(), DeliveryError> {
    let stderr = child.stderr.take().map(|mut pipe| {
        thread::spawn(move || {
            let mut text = String::new();
            if let Err(e) = pipe.read_to_string(&mut text) {
                debug!(error = %e, "reading sender stderr failed");
            }
            text
        })
    });

    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) if status.success() => return Ok(()),
            Ok(Some(status)) => {
                let stderr = stderr
                    .map(|reader| reader.join().unwrap_or_default())
                    .unwrap_or_default();
                return Err(DeliveryError::Rejected {
                    code: status.code(),
                    stderr: stderr.trim().to_string(),
                });
            }
            Ok(None) if started.elapsed() >= timeout => {
                kill(&mut child);
                return Err(DeliveryError::Timeout(timeout));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                kill(&mut child);
                return Err(DeliveryError::Spawn(e));
            }
        }
    }
}

fn kill(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!(error = %e, "killing the sender failed");
    }
    if let Err(e) = child.wait() {
        debug!(error = %e, "reaping the sender failed");
    }
}
