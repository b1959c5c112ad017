use netcli_collector_config::Endpoint;
use std::collections::HashMap;

/// Raw command output keyed by (device address, exact command text).
///
/// Lives only as long as one orchestration call. Nothing is ever written to disk.
#[derive(Debug, Default)]
pub struct CommandCache {
    entries: HashMap<(String, String), String>,
}

impl CommandCache {
    pub fn get(&self, endpoint: &Endpoint, command: &str) -> Option<&str> {
        self.entries
            .get(&(endpoint.address(), command.to_string()))
            .map(String::as_str)
    }

    pub fn insert(&mut self, endpoint: &Endpoint, command: &str, text: String) {
        self.entries.insert((endpoint.address(), command.to_string()), text);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcli_collector_config::VendorProfile;

    #[test]
    fn keys_include_the_device() {
        let a = Endpoint::parse("192.0.2.1", "22", "u", "p", VendorProfile::default()).unwrap();
        let b = Endpoint::parse("192.0.2.2", "22", "u", "p", VendorProfile::default()).unwrap();
        let mut cache = CommandCache::default();

        cache.insert(&a, "display version", "A".to_string());
        assert_eq!(cache.get(&a, "display version"), Some("A"));
        assert_eq!(cache.get(&b, "display version"), None);
        assert_eq!(cache.get(&a, "display version "), None);

        cache.clear();
        assert!(cache.is_empty());
    }
}
