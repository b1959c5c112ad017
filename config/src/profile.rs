use serde::{
    Deserialize,
    Serialize,
};
use strum::{
    Display,
    EnumIter,
    EnumString,
};

/// The device family a run talks to. Selects the commands, parsers and item keys.
#[derive(Debug, Default, Clone, Copy, Display, EnumIter, EnumString, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum VendorProfile {
    /// Huawei routers: BGP peers and routing table statistics.
    HuaweiBgp,
    /// Huawei routers: CPU, memory, fans, power and IPU temperature sensors.
    HuaweiHealth,
    /// Huawei routers: 100GE optical modules with per-lane readings.
    HuaweiOptical,
    /// Huawei CE/S switches: transceivers, BGP, power, fans and version.
    #[default]
    HuaweiSwitch,
    /// Datacom switches returning transceiver state as JSON.
    DatacomTransceiver,
}

impl VendorProfile {
    /// Command sent ahead of every exec so the device does not paginate its output.
    pub fn pager_preamble(&self) -> Option<&'static str> {
        match self {
            VendorProfile::HuaweiBgp
            | VendorProfile::HuaweiHealth
            | VendorProfile::HuaweiOptical
            | VendorProfile::HuaweiSwitch => Some("screen-length 0 temporary"),
            VendorProfile::DatacomTransceiver => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn names_round_trip_through_strum() {
        for profile in VendorProfile::iter() {
            let name = profile.to_string();
            assert_eq!(VendorProfile::from_str(&name).unwrap(), profile);
        }
        assert_eq!(
            VendorProfile::from_str("datacom-transceiver").unwrap(),
            VendorProfile::DatacomTransceiver
        );
    }

    #[test]
    fn only_huawei_disables_paging() {
        assert!(VendorProfile::HuaweiSwitch.pager_preamble().is_some());
        assert!(VendorProfile::DatacomTransceiver.pager_preamble().is_none());
    }
}
