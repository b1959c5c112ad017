use crate::{
    error::UsageError,
    VendorProfile,
};
use std::fmt;

/// Password authentication material. The password never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The device one run talks to. Immutable for the lifetime of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub credentials: Credentials,
    pub profile: VendorProfile,
}

impl Endpoint {
    /// Builds an endpoint from the raw positional arguments the monitoring server passes.
    ///
    /// Fails when the server handed us a literal `{$MACRO}` instead of its value, or when the
    /// port is not a usable TCP port.
    pub fn parse(
        host: &str,
        port: &str,
        user: &str,
        password: &str,
        profile: VendorProfile,
    ) -> Result<Self, UsageError> {
        if host.trim().is_empty() {
            return Err(UsageError::Empty("host"));
        }
        reject_macro("{$SSH_PORT}", port)?;
        reject_macro("{$SSH_USER}", user)?;
        reject_macro("{$SSH_PASS}", password)?;

        let port = match port.trim().parse::<u16>() {
            Ok(0) | Err(_) => return Err(UsageError::InvalidPort(port.to_string())),
            Ok(port) => port,
        };

        Ok(Self {
            host: host.trim().to_string(),
            port,
            credentials: Credentials {
                user: user.to_string(),
                password: password.to_string(),
            },
            profile,
        })
    }

    /// `host:port`, bracketed for IPv6 literals.
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// The name the monitoring server knows the device under. Trapper items are addressed to it.
pub fn validate_target(target: &str) -> Result<&str, UsageError> {
    reject_macro("{HOST.HOST}", target)?;
    if target.trim().is_empty() {
        return Err(UsageError::Empty("target name"));
    }
    Ok(target)
}

fn reject_macro(macro_name: &'static str, value: &str) -> Result<(), UsageError> {
    if value.starts_with("{$") || value == macro_name {
        return Err(UsageError::UnresolvedMacro {
            macro_name,
            value: value.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_a_plain_endpoint() {
        let endpoint = Endpoint::parse("10.0.0.1", "2222", "admin", "secret", VendorProfile::HuaweiBgp).unwrap();
        assert_eq!(endpoint.port, 2222);
        assert_eq!(endpoint.address(), "10.0.0.1:2222");
        assert_eq!(endpoint.credentials.user, "admin");
    }

    #[test]
    fn brackets_ipv6_hosts() {
        let endpoint = Endpoint::parse("2001:db8::1", "22", "a", "b", VendorProfile::default()).unwrap();
        assert_eq!(endpoint.address(), "[2001:db8::1]:22");
    }

    #[test]
    fn rejects_unresolved_macros() {
        let err = Endpoint::parse("10.0.0.1", "{$SSH_PORT}", "admin", "x", VendorProfile::default()).unwrap_err();
        assert!(matches!(err, UsageError::UnresolvedMacro { macro_name: "{$SSH_PORT}", .. }));

        let err = Endpoint::parse("10.0.0.1", "22", "admin", "{$SSH_PASS}", VendorProfile::default()).unwrap_err();
        assert!(matches!(err, UsageError::UnresolvedMacro { macro_name: "{$SSH_PASS}", .. }));
    }

    #[test]
    fn rejects_bad_ports() {
        for port in ["", "ssh", "0", "70000"] {
            let err = Endpoint::parse("h", port, "u", "p", VendorProfile::default()).unwrap_err();
            assert_eq!(err, UsageError::InvalidPort(port.to_string()));
        }
    }

    #[test]
    fn debug_output_hides_the_password() {
        let endpoint = Endpoint::parse("h", "22", "u", "hunter2", VendorProfile::default()).unwrap();
        let rendered = format!("{endpoint:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn target_must_be_resolved_and_non_empty() {
        assert_eq!(validate_target("edge-router-1").unwrap(), "edge-router-1");
        assert_eq!(validate_target("  ").unwrap_err(), UsageError::Empty("target name"));
        assert!(validate_target("{HOST.HOST}").is_err());
    }
}
