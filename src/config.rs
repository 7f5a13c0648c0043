use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::Path;

use crate::error::{Error, Result};
use crate::mac::MacAddress;
use crate::policy::BootFile;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub mac_address: MacAddress,
    pub bind_address: Ipv4Addr,
    pub offered_address: Ipv4Addr,
    pub subnet_mask: Ipv4Addr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<Ipv4Addr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boot_file: Option<String>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        PartialConfig::from_file(path)?.build()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !is_host_address(self.bind_address) {
            return Err(Error::InvalidConfig(format!(
                "bind_address {} is not a usable host address",
                self.bind_address
            )));
        }

        if !is_host_address(self.offered_address) {
            return Err(Error::InvalidConfig(format!(
                "offered_address {} is not a usable host address",
                self.offered_address
            )));
        }

        if self.offered_address == self.bind_address {
            return Err(Error::InvalidConfig(
                "offered_address must differ from bind_address".to_string(),
            ));
        }

        let mask = u32::from(self.subnet_mask);
        if mask == 0 || mask.leading_ones() + mask.trailing_zeros() != u32::BITS {
            return Err(Error::InvalidConfig(format!(
                "subnet_mask {} is not a contiguous netmask",
                self.subnet_mask
            )));
        }

        if let Some(gateway) = self.gateway {
            if !is_host_address(gateway) {
                return Err(Error::InvalidConfig(format!(
                    "gateway {} is not a usable host address",
                    gateway
                )));
            }
            if gateway == self.offered_address {
                return Err(Error::InvalidConfig(
                    "gateway must differ from offered_address".to_string(),
                ));
            }
        }

        if let Some(boot_file) = &self.boot_file {
            boot_file.parse::<BootFile>()?;
        }

        Ok(())
    }
}

fn is_host_address(ip: Ipv4Addr) -> bool {
    !(ip.is_unspecified() || ip.is_broadcast() || ip.is_multicast())
}

/// A configuration with every field optional.
///
/// Layers from the config file and the command line are merged with
/// [`overlay`](Self::overlay) and turned into a [`Config`] by
/// [`build`](Self::build), which reports the first missing field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    pub mac_address: Option<MacAddress>,
    pub bind_address: Option<Ipv4Addr>,
    pub offered_address: Option<Ipv4Addr>,
    pub subnet_mask: Option<Ipv4Addr>,
    pub gateway: Option<Ipv4Addr>,
    pub boot_file: Option<String>,
}

impl PartialConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PartialConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Fields set in `other` win over fields set in `self`.
    pub fn overlay(self, other: PartialConfig) -> Self {
        Self {
            mac_address: other.mac_address.or(self.mac_address),
            bind_address: other.bind_address.or(self.bind_address),
            offered_address: other.offered_address.or(self.offered_address),
            subnet_mask: other.subnet_mask.or(self.subnet_mask),
            gateway: other.gateway.or(self.gateway),
            boot_file: other.boot_file.or(self.boot_file),
        }
    }

    pub fn build(self) -> Result<Config> {
        let config = Config {
            mac_address: required(self.mac_address, "MAC address", "-m/--mac")?,
            bind_address: required(self.bind_address, "bind address", "-b/--bind")?,
            offered_address: required(self.offered_address, "offered address", "-i/--ip")?,
            subnet_mask: required(self.subnet_mask, "subnet mask", "-s/--subnet")?,
            gateway: self.gateway,
            boot_file: self.boot_file,
        };
        config.validate()?;
        Ok(config)
    }
}

fn required<T>(value: Option<T>, what: &str, flag: &str) -> Result<T> {
    value.ok_or_else(|| Error::InvalidConfig(format!("{} not specified ({})", what, flag)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            mac_address: "b8:27:eb:c3:27:b5".parse().unwrap(),
            bind_address: Ipv4Addr::new(192, 168, 1, 53),
            offered_address: Ipv4Addr::new(192, 168, 1, 100),
            subnet_mask: Ipv4Addr::new(255, 255, 255, 0),
            gateway: Some(Ipv4Addr::new(192, 168, 1, 254)),
            boot_file: None,
        }
    }

    struct TestGuard(String);
    impl Drop for TestGuard {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_offered_equals_bind() {
        let config = Config {
            offered_address: Ipv4Addr::new(192, 168, 1, 53),
            ..test_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unusable_addresses() {
        for bad in [
            Ipv4Addr::UNSPECIFIED,
            Ipv4Addr::BROADCAST,
            Ipv4Addr::new(224, 0, 0, 1),
        ] {
            let config = Config {
                offered_address: bad,
                ..test_config()
            };
            assert!(config.validate().is_err(), "offered {} accepted", bad);

            let config = Config {
                bind_address: bad,
                ..test_config()
            };
            assert!(config.validate().is_err(), "bind {} accepted", bad);
        }
    }

    #[test]
    fn test_subnet_mask_must_be_contiguous() {
        for bad in [
            Ipv4Addr::new(255, 0, 255, 0),
            Ipv4Addr::new(0, 0, 0, 255),
            Ipv4Addr::UNSPECIFIED,
        ] {
            let config = Config {
                subnet_mask: bad,
                ..test_config()
            };
            assert!(config.validate().is_err(), "mask {} accepted", bad);
        }

        for good in [
            Ipv4Addr::new(255, 255, 255, 255),
            Ipv4Addr::new(255, 255, 252, 0),
            Ipv4Addr::new(128, 0, 0, 0),
        ] {
            let config = Config {
                subnet_mask: good,
                ..test_config()
            };
            assert!(config.validate().is_ok(), "mask {} rejected", good);
        }
    }

    #[test]
    fn test_gateway_equals_offered() {
        let config = Config {
            gateway: Some(Ipv4Addr::new(192, 168, 1, 100)),
            ..test_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_boot_file() {
        let config = Config {
            boot_file: Some("x".repeat(200)),
            ..test_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overlay_prefers_later_layer() {
        let file_layer = PartialConfig {
            mac_address: Some("aa:bb:cc:dd:ee:ff".parse().unwrap()),
            bind_address: Some(Ipv4Addr::new(10, 0, 0, 1)),
            gateway: Some(Ipv4Addr::new(10, 0, 0, 254)),
            ..Default::default()
        };
        let cli_layer = PartialConfig {
            bind_address: Some(Ipv4Addr::new(10, 0, 0, 2)),
            offered_address: Some(Ipv4Addr::new(10, 0, 0, 50)),
            subnet_mask: Some(Ipv4Addr::new(255, 255, 255, 0)),
            ..Default::default()
        };

        let config = file_layer.overlay(cli_layer).build().unwrap();
        assert_eq!(config.mac_address.to_string(), "aa:bb:cc:dd:ee:ff");
        assert_eq!(config.bind_address, Ipv4Addr::new(10, 0, 0, 2));
        assert_eq!(config.offered_address, Ipv4Addr::new(10, 0, 0, 50));
        assert_eq!(config.gateway, Some(Ipv4Addr::new(10, 0, 0, 254)));
    }

    #[test]
    fn test_build_reports_missing_field() {
        let layer = PartialConfig {
            bind_address: Some(Ipv4Addr::new(10, 0, 0, 1)),
            ..Default::default()
        };
        match layer.build() {
            Err(Error::InvalidConfig(message)) => assert!(message.contains("-m/--mac")),
            other => panic!("expected missing MAC error, got {:?}", other),
        }
    }

    #[test]
    fn test_save_and_load() {
        let path = "test_config_load.json".to_string();
        let _guard = TestGuard(path.clone());

        test_config().save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, test_config());
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        let path = "test_config_unknown.json".to_string();
        let _guard = TestGuard(path.clone());

        std::fs::write(&path, r#"{"mac_address": "aa:bb:cc:dd:ee:ff", "pool_start": "10.0.0.1"}"#)
            .unwrap();
        assert!(matches!(PartialConfig::from_file(&path), Err(Error::Json(_))));
    }

    #[test]
    fn test_optional_fields_omitted_from_json() {
        let config = Config {
            gateway: None,
            ..test_config()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("gateway"));
        assert!(!json.contains("boot_file"));
        assert!(json.contains("\"mac_address\":\"b8:27:eb:c3:27:b5\""));
    }
}
