use super::{
    Connector,
    RemoteShell,
};
use crate::error::TransportError;
use netcli_collector_config::Endpoint;
use ssh2::{
    CheckResult,
    ErrorCode,
    KnownHostFileKind,
    Session,
};
use std::{
    io::{
        self,
        Read,
    },
    net::{
        TcpStream,
        ToSocketAddrs,
    },
    path::PathBuf,
    time::Duration,
};

const LIBSSH2_ERROR_TIMEOUT: i32 = -9;

/// Password-authenticated SSH with trust-on-first-use host keys.
///
/// Unknown host keys are accepted and appended to `known_hosts`. A key that differs from
/// the remembered one aborts the connection.
#[derive(Debug, Clone)]
pub struct SshConnector {
    known_hosts: PathBuf,
}

impl SshConnector {
    pub fn new(known_hosts: impl Into<PathBuf>) -> Self {
        Self {
            known_hosts: known_hosts.into(),
        }
    }

    fn verify_host_key(&self, session: &Session, endpoint: &Endpoint) -> Result<(), TransportError> {
        let mut known_hosts = session
            .known_hosts()
            .map_err(|e| TransportError::HostKey(e.to_string()))?;
        if self.known_hosts.exists() {
            known_hosts
                .read_file(&self.known_hosts, KnownHostFileKind::OpenSSH)
                .map_err(|e| TransportError::HostKey(format!("reading {:?}: {e}", self.known_hosts)))?;
        }

        let (key, key_type) = session
            .host_key()
            .ok_or_else(|| TransportError::HostKey("server did not present a host key".to_string()))?;

        match known_hosts.check_port(&endpoint.host, endpoint.port, key) {
            CheckResult::Match => Ok(()),
            CheckResult::Mismatch => Err(TransportError::HostKeyMismatch {
                host: endpoint.address(),
                known_hosts: self.known_hosts.display().to_string(),
            }),
            CheckResult::Failure => Err(TransportError::HostKey("libssh2 could not check the host key".to_string())),
            CheckResult::NotFound => {
                let entry = if endpoint.port == 22 {
                    endpoint.host.clone()
                } else {
                    format!("[{}]:{}", endpoint.host, endpoint.port)
                };
                known_hosts
                    .add(&entry, key, "added by netcli-collector", key_type.into())
                    .map_err(|e| TransportError::HostKey(e.to_string()))?;
                if let Some(parent) = self.known_hosts.parent() {
                    if let Err(e) = std::fs::create_dir_all(parent) {
                        warn!(error = %e, "cannot create known_hosts directory");
                    }
                }
                match known_hosts.write_file(&self.known_hosts, KnownHostFileKind::OpenSSH) {
                    Ok(()) => info!(host = %entry, path = ?self.known_hosts, "remembered new host key"),
                    Err(e) => warn!(host = %entry, error = %e, "accepted host key but could not persist it"),
                }
                Ok(())
            }
        }
    }
}

impl Connector for SshConnector {
    fn connect(&self, endpoint: &Endpoint, timeout: Duration) -> Result<Box<dyn RemoteShell>, TransportError> {
        let address = endpoint.address();
        let socket = (endpoint.host.as_str(), endpoint.port)
            .to_socket_addrs()
            .map_err(|source| TransportError::Resolve {
                address: address.clone(),
                source,
            })?
            .next()
            .ok_or_else(|| TransportError::Resolve {
                address: address.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "no addresses"),
            })?;

        let tcp = TcpStream::connect_timeout(&socket, timeout).map_err(|source| TransportError::Connect {
            address: address.clone(),
            source,
        })?;

        let mut session = Session::new().map_err(|source| TransportError::Handshake {
            address: address.clone(),
            source,
        })?;
        session.set_timeout(millis(timeout));
        session.set_tcp_stream(tcp);
        session.handshake().map_err(|source| TransportError::Handshake {
            address: address.clone(),
            source,
        })?;

        self.verify_host_key(&session, endpoint)?;

        let credentials = &endpoint.credentials;
        if session
            .userauth_password(&credentials.user, &credentials.password)
            .is_err()
            || !session.authenticated()
        {
            return Err(TransportError::Authentication {
                user: credentials.user.clone(),
            });
        }

        debug!(%address, "SSH session established");
        Ok(Box::new(SshShell { session }))
    }
}

struct SshShell {
    session: Session,
}

impl RemoteShell for SshShell {
    fn run(&mut self, command: &str, timeout: Duration) -> Result<String, TransportError> {
        self.session.set_timeout(millis(timeout));

        let exec_failure = |source: ssh2::Error| {
            if matches!(source.code(), ErrorCode::Session(LIBSSH2_ERROR_TIMEOUT)) {
                TransportError::Timeout {
                    command: command.to_string(),
                    timeout,
                }
            } else {
                TransportError::Exec {
                    command: command.to_string(),
                    source,
                }
            }
        };

        let mut channel = self.session.channel_session().map_err(exec_failure)?;
        channel.exec(command).map_err(exec_failure)?;

        let mut raw = Vec::new();
        channel.read_to_end(&mut raw).map_err(|source| {
            if source.kind() == io::ErrorKind::TimedOut {
                TransportError::Timeout {
                    command: command.to_string(),
                    timeout,
                }
            } else {
                TransportError::Read {
                    command: command.to_string(),
                    source,
                }
            }
        })?;

        if let Err(e) = channel.wait_close() {
            trace!(error = %e, "channel did not close cleanly");
        }

        Ok(decode(raw))
    }

    fn close(&mut self) {
        if let Err(e) = self.session.disconnect(None, "collection finished", None) {
            trace!(error = %e, "disconnect failed");
        }
    }
}

fn millis(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX).max(1)
}

/// Devices mostly answer in UTF-8. Some firmware emits Latin-1 in descriptions.
fn decode(raw: Vec<u8>) -> String {
    match String::from_utf8(raw) {
        Ok(text) => text,
        Err(e) => e.into_bytes().into_iter().map(char::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_latin1_fallback() {
        assert_eq!(decode(b"Porta 1".to_vec()), "Porta 1");
        assert_eq!(decode(vec![b'S', 0xE3, b'o']), "São");
    }

    #[test]
    fn timeouts_are_never_zero_millis() {
        assert_eq!(millis(Duration::from_micros(10)), 1);
        assert_eq!(millis(Duration::from_secs(20)), 20_000);
    }
}
