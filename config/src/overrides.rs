use crate::VendorProfile;
use config::{
    Map,
    Source,
    Value,
};
use std::{
    collections::HashMap,
    path::PathBuf,
};

/// Values given on the command line. They win over every other configuration layer.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub profile: Option<VendorProfile>,
    pub known_hosts: Option<PathBuf>,
    pub sender_binary: Option<PathBuf>,
}

impl Source for Overrides {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new((*self).clone())
    }

    fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
        let mut cache = HashMap::<String, Value>::new();
        if let Some(profile) = &self.profile {
            cache.insert("profile".to_string(), profile.to_string().into());
        }
        if let Some(path) = &self.known_hosts {
            cache.insert("known_hosts".to_string(), path.to_string_lossy().to_string().into());
        }
        if let Some(path) = &self.sender_binary {
            cache.insert("sender.binary".to_string(), path.to_string_lossy().to_string().into());
        }
        Ok(cache)
    }
}
