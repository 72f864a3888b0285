//! Wi-Fi and provisioning lifecycle events.
//!
//! The platform network stack delivers events asynchronously; this module
//! models them as a tagged union and maps each recognized kind to a
//! human-readable diagnostic line. Kinds outside the recognized set map to
//! nothing, so the ignore-unknown behavior is an explicit, testable branch
//! rather than an accident of dispatch.

use std::net::Ipv4Addr;
use std::sync::Arc;

use log::{info, warn};

/// Callback invoked by the platform port for every delivered event.
///
/// Registered once for the process lifetime. Implementations must not
/// block and must not panic; they run on the platform's event task.
pub type EventHandler = Arc<dyn Fn(&StackEvent) + Send + Sync + 'static>;

/// A lifecycle event delivered by the network/provisioning stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackEvent {
    /// Station acquired an IPv4 address.
    StaGotIp(Ipv4Addr),
    /// An established station connection was lost.
    StaDisconnected,
    /// A provisioning session started.
    ProvStarted,
    /// The pairing device supplied Wi-Fi credentials.
    ProvCredentialsReceived,
    /// The supplied credentials failed validation.
    ProvCredentialsFailed,
    /// The supplied credentials validated successfully.
    ProvCredentialsOk,
    /// The provisioning session ended.
    ProvEnded,
    /// Any event kind outside the recognized set, with its raw platform id.
    Other(i32),
}

/// Map an event to its diagnostic line.
///
/// Returns `None` for [`StackEvent::Other`]: unrecognized kinds produce no
/// output and alter no state.
pub fn format_event(event: &StackEvent) -> Option<String> {
    match event {
        StackEvent::StaGotIp(ip) => Some(format!("Connected, IP: {}", ip)),
        StackEvent::StaDisconnected => Some("Wi-Fi disconnected, waiting for reconnect".to_string()),
        StackEvent::ProvStarted => Some("Provisioning started".to_string()),
        StackEvent::ProvCredentialsReceived => Some("Received Wi-Fi credentials".to_string()),
        StackEvent::ProvCredentialsFailed => Some("Provisioning failed".to_string()),
        StackEvent::ProvCredentialsOk => Some("Provisioning successful".to_string()),
        StackEvent::ProvEnded => Some("Provisioning ended".to_string()),
        StackEvent::Other(_) => None,
    }
}

/// Log an event through the `log` facade.
///
/// Failure notices go out at warn level, everything else at info. Events
/// with no mapping are dropped silently.
pub fn observe(event: &StackEvent) {
    let Some(line) = format_event(event) else {
        return;
    };
    match event {
        StackEvent::StaDisconnected | StackEvent::ProvCredentialsFailed => warn!("{}", line),
        _ => info!("{}", line),
    }
}
