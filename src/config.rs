//! Provisioning configuration.
//!
//! All values are fixed at build time and injected into the bootstrap
//! controller as one structure, so tests can substitute their own values
//! and no module reads secrets from scattered literals.
//!
//! The proof-of-possession secret and the optional service key are wiped
//! from memory when the configuration is dropped.

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Proof-of-possession secret baked into the stock firmware.
pub const DEFAULT_POP: &str = "abcd1234";

/// Name under which the device advertises itself while provisioning.
pub const DEFAULT_SERVICE_NAME: &str = "PROV_123";

/// Service UUID advertised over BLE during provisioning.
pub const DEVICE_UUID: [u8; 16] = [
    0xb4, 0xdf, 0x5a, 0x1c, 0x3f, 0x6b, 0xf4, 0xbf, 0xea, 0x4a, 0x82, 0x03, 0x04, 0x90, 0x1a, 0x02,
];

/// Parameters for a BLE provisioning session.
///
/// The secret fields are passed through to the provisioning security layer
/// opaquely; nothing here validates them.
#[derive(Debug, Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ProvisionConfig {
    /// Proof-of-possession secret authenticating the pairing device.
    pub pop: String,
    /// Advertised service name.
    pub service_name: String,
    /// Optional secondary secret; `None` when the deployment uses none.
    pub service_key: Option<String>,
    /// 16-byte service UUID advertised over the BLE transport.
    pub device_uuid: [u8; 16],
    /// Wipe previously stored credentials before starting, so an already
    /// provisioned device can be provisioned again.
    pub reprovision: bool,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            pop: DEFAULT_POP.to_string(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            service_key: None,
            device_uuid: DEVICE_UUID,
            reprovision: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = ProvisionConfig::default();
        assert_eq!(config.pop, "abcd1234");
        assert_eq!(config.service_name, "PROV_123");
        assert_eq!(config.service_key, None);
        assert_eq!(config.device_uuid, DEVICE_UUID);
        assert!(!config.reprovision);
    }

    #[test]
    fn test_uuid_first_and_last_bytes() {
        assert_eq!(DEVICE_UUID[0], 0xb4);
        assert_eq!(DEVICE_UUID[15], 0x02);
    }

    #[test]
    fn test_custom_values_survive_clone() {
        let config = ProvisionConfig {
            pop: "topsecret".to_string(),
            service_name: "PROV_TEST".to_string(),
            service_key: Some("key".to_string()),
            device_uuid: [0u8; 16],
            reprovision: true,
        };
        let clone = config.clone();
        assert_eq!(config, clone);
        assert_eq!(clone.service_key.as_deref(), Some("key"));
    }
}
