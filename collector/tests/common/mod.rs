//! In-memory device and trapper for pipeline tests.

#![allow(dead_code)]

use netcli_collector_config::{
    Config,
    Endpoint,
    Timeouts,
    VendorProfile,
};
use netcli_collector_core::{
    Connector,
    DeliveryError,
    RemoteShell,
    TransportError,
    TrapperLine,
    TrapperSender,
};
use std::{
    cell::RefCell,
    collections::HashMap,
    io,
    rc::Rc,
    time::Duration,
};

#[derive(Debug, Default)]
pub struct DeviceLog {
    pub connects: usize,
    pub closes: usize,
    /// Bare commands in the order they reached the device.
    pub commands: Vec<String>,
}

/// A device that answers from a script and remembers what it was asked.
#[derive(Default)]
pub struct FakeDevice {
    replies: Rc<HashMap<String, String>>,
    refuse_connections: bool,
    failing_command: Option<String>,
    pub log: Rc<RefCell<DeviceLog>>,
}

impl FakeDevice {
    pub fn new(replies: &[(&str, &str)]) -> Self {
        Self {
            replies: Rc::new(
                replies
                    .iter()
                    .map(|(command, text)| (command.to_string(), text.to_string()))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    pub fn refusing_connections(mut self) -> Self {
        self.refuse_connections = true;
        self
    }

    /// `command` times out instead of answering.
    pub fn hanging_on(mut self, command: &str) -> Self {
        self.failing_command = Some(command.to_string());
        self
    }

    pub fn connects(&self) -> usize {
        self.log.borrow().connects
    }

    pub fn closes(&self) -> usize {
        self.log.borrow().closes
    }

    pub fn commands(&self) -> Vec<String> {
        self.log.borrow().commands.clone()
    }
}

struct FakeShell {
    replies: Rc<HashMap<String, String>>,
    failing_command: Option<String>,
    log: Rc<RefCell<DeviceLog>>,
}

impl RemoteShell for FakeShell {
    fn run(&mut self, command: &str, timeout: Duration) -> Result<String, TransportError> {
        // The pager preamble comes first, the command last.
        let command = command.rsplit('\n').next().unwrap_or(command);
        self.log.borrow_mut().commands.push(command.to_string());
        if self.failing_command.as_deref() == Some(command) {
            return Err(TransportError::Timeout {
                command: command.to_string(),
                timeout,
            });
        }
        Ok(self.replies.get(command).cloned().unwrap_or_default())
    }

    fn close(&mut self) {
        self.log.borrow_mut().closes += 1;
    }
}

impl Connector for FakeDevice {
    fn connect(&self, endpoint: &Endpoint, _timeout: Duration) -> Result<Box<dyn RemoteShell>, TransportError> {
        self.log.borrow_mut().connects += 1;
        if self.refuse_connections {
            return Err(TransportError::Connect {
                address: endpoint.address(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
            });
        }
        Ok(Box::new(FakeShell {
            replies: self.replies.clone(),
            failing_command: self.failing_command.clone(),
            log: self.log.clone(),
        }))
    }
}

/// A trapper that keeps everything it was given and rejects what it is told to.
#[derive(Default)]
pub struct RecordingSender {
    pub items: RefCell<Vec<TrapperLine>>,
    pub batches: RefCell<Vec<Vec<TrapperLine>>>,
    rejected_keys: Vec<String>,
    reject_batches: bool,
}

impl RecordingSender {
    pub fn rejecting(keys: &[&str]) -> Self {
        Self {
            rejected_keys: keys.iter().map(|key| key.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn rejecting_batches() -> Self {
        Self {
            reject_batches: true,
            ..Default::default()
        }
    }

    pub fn item_keys(&self) -> Vec<String> {
        self.items.borrow().iter().map(|line| line.key.clone()).collect()
    }
}

fn rejected() -> DeliveryError {
    DeliveryError::Rejected {
        code: Some(2),
        stderr: "processed: 0; failed: 1".to_string(),
    }
}

impl TrapperSender for RecordingSender {
    fn send_item(&self, line: &TrapperLine, _timeout: Duration) -> Result<(), DeliveryError> {
        self.items.borrow_mut().push(line.clone());
        if self.rejected_keys.contains(&line.key) {
            return Err(rejected());
        }
        Ok(())
    }

    fn send_batch(&self, lines: &[TrapperLine], _timeout: Duration) -> Result<(), DeliveryError> {
        self.batches.borrow_mut().push(lines.to_vec());
        if self.reject_batches {
            return Err(rejected());
        }
        Ok(())
    }
}

pub fn endpoint(profile: VendorProfile) -> Endpoint {
    Endpoint::parse("192.0.2.10", "22", "monitor", "secret", profile).unwrap()
}

pub fn timeouts() -> Timeouts {
    Config::default().timeouts
}

pub const V4_PEERS: &str = r#"
 BGP Peer is 10.0.0.1,  remote AS 65001
 Peer's description: "TRANSIT A"
 BGP current state: Established, Up for 24d4h3m2s
 Received total routes: 812345
 Advertised total routes: 12
"#;

/// A router with one described IPv4 peer and every route counter.
pub fn bgp_router() -> Vec<(&'static str, &'static str)> {
    vec![
        ("display bgp peer verbose | no-more", V4_PEERS),
        ("display ip routing-table statistics", "Summary Prefixes : 900000\n"),
        ("display ipv6 routing-table statistics", "Summary Prefixes : 200000\n"),
        ("display bgp routing-table statistics", "Total Number of Routes: 850000\n"),
        ("display bgp ipv6 routing-table statistics", "Total Number of Routes: 150000\n"),
    ]
}

pub const IPU_TEMPERATURES: &str = "\
Base-Board, Unit:C, Slot 3
PCB    I2C  Addr  Chl  Status  Minor  Major  Fatal  Adj  Fan  Temp(C)
IPU    0    72    0    NORMAL  75     85     95     0    40   41
IPU    0    73    1    NORMAL  75     85     95     0    40   39
";

/// A router reporting CPU and two IPU temperature sensors, nothing else.
pub fn health_router() -> Vec<(&'static str, &'static str)> {
    vec![
        ("display cpu-usage | no-more", "System cpu use rate is : 12%\n"),
        ("display temperature ipu | no-more", IPU_TEMPERATURES),
    ]
}
