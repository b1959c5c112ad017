//! Scripted device for collector unit tests.

use crate::{
    deadline::Deadline,
    error::TransportError,
    executor::{
        Connector,
        Executor,
        RemoteShell,
    },
};
use netcli_collector_config::{
    Config,
    Endpoint,
    VendorProfile,
};
use std::{
    collections::HashMap,
    rc::Rc,
    time::Duration,
};

struct ScriptedShell {
    replies: Rc<HashMap<String, String>>,
}

impl RemoteShell for ScriptedShell {
    fn run(&mut self, command: &str, _timeout: Duration) -> Result<String, TransportError> {
        let command = command.rsplit('\n').next().unwrap_or(command);
        Ok(self.replies.get(command).cloned().unwrap_or_default())
    }

    fn close(&mut self) {}
}

struct ScriptedConnector {
    replies: Rc<HashMap<String, String>>,
}

impl Connector for ScriptedConnector {
    fn connect(&self, _endpoint: &Endpoint, _timeout: Duration) -> Result<Box<dyn RemoteShell>, TransportError> {
        Ok(Box::new(ScriptedShell {
            replies: self.replies.clone(),
        }))
    }
}

/// Runs `f` against a device that answers each command from `replies` and prints nothing
/// for anything else.
pub(crate) fn with_device<T>(
    profile: VendorProfile,
    replies: &[(&str, &str)],
    f: impl FnOnce(&mut Executor<'_>) -> T,
) -> T {
    let connector = ScriptedConnector {
        replies: Rc::new(
            replies
                .iter()
                .map(|(command, text)| (command.to_string(), text.to_string()))
                .collect(),
        ),
    };
    let endpoint = Endpoint::parse("192.0.2.1", "22", "admin", "secret", profile).unwrap();
    let mut executor = Executor::new(
        &endpoint,
        &connector,
        Config::default().timeouts,
        Deadline::after(Duration::from_secs(30)),
    );
    f(&mut executor)
}
