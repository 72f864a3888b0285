//! Platform port for Wi-Fi and provisioning.
//!
//! The bootstrap controller depends on this trait instead of the ESP-IDF
//! APIs directly, so the host test suite can drive it with a fake and the
//! connection status stays a read-only query rather than a hidden global.
//!
//! - **ESP32** (`esp32` feature): [`EspWifiPort`] over the ESP-IDF driver
//!   and provisioning manager
//! - **Host**: fakes in the test suites

use std::fmt;

use crate::config::ProvisionConfig;
use crate::event::EventHandler;

#[cfg(feature = "esp32")]
mod esp;

#[cfg(feature = "esp32")]
pub use esp::EspWifiPort;

/// Connection status as observed from the platform stack.
///
/// The stack owns every transition; this crate only reads the value and
/// only ever branches on [`ConnStatus::Connected`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnStatus {
    /// Bootstrap has not run yet.
    Uninitialized,
    /// A provisioning session is active.
    Provisioning,
    /// Credentials are known but the link is not up yet.
    CredentialsPending,
    /// The station is connected.
    Connected,
    /// A previously started connection is down.
    Disconnected,
}

impl fmt::Display for ConnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Provisioning => "provisioning",
            Self::CredentialsPending => "credentials-pending",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        };
        write!(f, "{}", s)
    }
}

/// Capabilities the bootstrap controller needs from the platform.
///
/// One implementation wraps ESP-IDF; tests substitute recording fakes.
/// Failures returned here never travel past the controller, which logs
/// them and carries on, matching the contract that all lower-level
/// failures surface only as diagnostics.
pub trait WifiPort {
    /// Register the lifecycle event callback for the process lifetime.
    fn subscribe(&mut self, handler: EventHandler) -> Result<(), PortError>;

    /// The persisted network name. Empty string means none stored.
    fn stored_ssid(&mut self) -> String;

    /// Start a BLE provisioning session with the given parameters.
    fn begin_provisioning(&mut self, config: &ProvisionConfig) -> Result<(), PortError>;

    /// Emit the out-of-band pairing aid for an active provisioning session.
    fn render_pairing_aid(&mut self, config: &ProvisionConfig) -> Result<(), PortError>;

    /// Start connecting with previously stored credentials.
    fn begin_connection(&mut self) -> Result<(), PortError>;

    /// Read the current connection status.
    fn status(&self) -> ConnStatus;
}

/// Errors surfaced by a platform port.
#[derive(Debug)]
pub enum PortError {
    /// The operation does not apply in the port's current state.
    InvalidState(&'static str),
    /// The underlying platform rejected the call.
    #[cfg(feature = "esp32")]
    Esp(esp_idf_sys::EspError),
}

impl fmt::Display for PortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidState(what) => write!(f, "invalid state: {}", what),
            #[cfg(feature = "esp32")]
            Self::Esp(e) => write!(f, "ESP error: {:?}", e),
        }
    }
}

impl std::error::Error for PortError {}

#[cfg(feature = "esp32")]
impl From<esp_idf_sys::EspError> for PortError {
    fn from(e: esp_idf_sys::EspError) -> Self {
        Self::Esp(e)
    }
}
