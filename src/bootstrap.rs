//! Boot-time Wi-Fi bootstrap.
//!
//! Decides once, at startup, whether the device can connect with stored
//! credentials or must fall back to BLE provisioning, then offers a
//! blocking wait that polls the platform until the link is up.
//!
//! The controller never fails toward its caller: port errors are logged
//! and swallowed, and everything that happens after `init` is observable
//! only through the event callback.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::config::ProvisionConfig;
use crate::event;
use crate::port::{ConnStatus, WifiPort};

/// Delay between connection-status polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Bootstrap controller over a platform port.
pub struct Bootstrap<P: WifiPort> {
    port: P,
    config: ProvisionConfig,
    poll_interval: Duration,
}

impl<P: WifiPort> Bootstrap<P> {
    /// Create a controller with the default poll interval.
    pub fn new(port: P, config: ProvisionConfig) -> Self {
        Self {
            port,
            config,
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Override the poll interval. Used by tests to keep waits short.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Register the event observer and start provisioning or connecting.
    ///
    /// Meant to run once per boot. Running it again re-registers the
    /// observer and re-runs exactly one branch, which on the device starts
    /// a second provisioning or connection attempt.
    pub fn init(&mut self) {
        if let Err(e) = self.port.subscribe(Arc::new(event::observe)) {
            error!("Event subscription failed: {}", e);
        }

        let ssid = self.port.stored_ssid();
        if ssid.is_empty() {
            info!("No Wi-Fi credentials found, starting BLE provisioning");
            if let Err(e) = self.port.begin_provisioning(&self.config) {
                error!("Could not start provisioning: {}", e);
                return;
            }
            if let Err(e) = self.port.render_pairing_aid(&self.config) {
                warn!("Could not render pairing aid: {}", e);
            }
        } else {
            info!("Wi-Fi credentials found, connecting to {}", ssid);
            if let Err(e) = self.port.begin_connection() {
                error!("Could not start connection: {}", e);
            }
        }
    }

    /// Block until the platform reports a connection.
    ///
    /// Polls the status query, sleeping [`POLL_INTERVAL`] between checks so
    /// the network stack can make progress. There is deliberately no upper
    /// bound: on permanent provisioning failure this waits forever, exactly
    /// like the stock firmware. Callers that need a deadline should wrap
    /// this in their own.
    pub fn wait_for_connection(&mut self) {
        loop {
            let status = self.port.status();
            if status == ConnStatus::Connected {
                break;
            }
            debug!("Waiting for Wi-Fi, status: {}", status);
            thread::sleep(self.poll_interval);
        }
        info!("Wi-Fi connected");
    }

    /// The injected provisioning configuration.
    pub fn config(&self) -> &ProvisionConfig {
        &self.config
    }

    /// Consume the controller and return the port.
    pub fn into_port(self) -> P {
        self.port
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventHandler;
    use crate::port::PortError;
    use std::cell::Cell;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Subscribe,
        StoredSsid,
        BeginProvisioning(ProvisionConfig),
        RenderPairingAid,
        BeginConnection,
    }

    /// Recording fake of the platform port.
    struct FakePort {
        calls: Vec<Call>,
        ssid: String,
        /// Number of status polls before the fake reports `Connected`.
        connect_after: u32,
        polls: Cell<u32>,
        fail_provisioning: bool,
    }

    impl FakePort {
        fn with_ssid(ssid: &str) -> Self {
            Self {
                calls: Vec::new(),
                ssid: ssid.to_string(),
                connect_after: 0,
                polls: Cell::new(0),
                fail_provisioning: false,
            }
        }
    }

    impl WifiPort for FakePort {
        fn subscribe(&mut self, _handler: EventHandler) -> Result<(), PortError> {
            self.calls.push(Call::Subscribe);
            Ok(())
        }

        fn stored_ssid(&mut self) -> String {
            self.calls.push(Call::StoredSsid);
            self.ssid.clone()
        }

        fn begin_provisioning(&mut self, config: &ProvisionConfig) -> Result<(), PortError> {
            self.calls.push(Call::BeginProvisioning(config.clone()));
            if self.fail_provisioning {
                return Err(PortError::InvalidState("provisioning unavailable"));
            }
            Ok(())
        }

        fn render_pairing_aid(&mut self, _config: &ProvisionConfig) -> Result<(), PortError> {
            self.calls.push(Call::RenderPairingAid);
            Ok(())
        }

        fn begin_connection(&mut self) -> Result<(), PortError> {
            self.calls.push(Call::BeginConnection);
            Ok(())
        }

        fn status(&self) -> ConnStatus {
            let polls = self.polls.get() + 1;
            self.polls.set(polls);
            if polls >= self.connect_after {
                ConnStatus::Connected
            } else {
                ConnStatus::CredentialsPending
            }
        }
    }

    fn short_poll<P: WifiPort>(bootstrap: Bootstrap<P>) -> Bootstrap<P> {
        bootstrap.with_poll_interval(Duration::from_millis(1))
    }

    #[test]
    fn test_empty_ssid_starts_provisioning() {
        let port = FakePort::with_ssid("");
        let mut bootstrap = Bootstrap::new(port, ProvisionConfig::default());
        bootstrap.init();

        let port = bootstrap.into_port();
        assert_eq!(
            port.calls,
            vec![
                Call::Subscribe,
                Call::StoredSsid,
                Call::BeginProvisioning(ProvisionConfig::default()),
                Call::RenderPairingAid,
            ]
        );
    }

    #[test]
    fn test_provisioning_branch_passes_injected_parameters() {
        let port = FakePort::with_ssid("");
        let config = ProvisionConfig {
            pop: "pop-for-test".to_string(),
            service_name: "PROV_TEST".to_string(),
            service_key: Some("svc-key".to_string()),
            device_uuid: [7u8; 16],
            reprovision: true,
        };
        let mut bootstrap = Bootstrap::new(port, config.clone());
        bootstrap.init();

        let port = bootstrap.into_port();
        match &port.calls[2] {
            Call::BeginProvisioning(seen) => assert_eq!(seen, &config),
            other => panic!("expected provisioning call, got {:?}", other),
        }
    }

    #[test]
    fn test_stored_ssid_connects_directly() {
        let port = FakePort::with_ssid("HomeNet");
        let mut bootstrap = Bootstrap::new(port, ProvisionConfig::default());
        bootstrap.init();

        let port = bootstrap.into_port();
        assert_eq!(
            port.calls,
            vec![Call::Subscribe, Call::StoredSsid, Call::BeginConnection]
        );
    }

    #[test]
    fn test_branches_are_mutually_exclusive() {
        let port = FakePort::with_ssid("HomeNet");
        let mut bootstrap = Bootstrap::new(port, ProvisionConfig::default());
        bootstrap.init();

        let port = bootstrap.into_port();
        assert!(!port
            .calls
            .iter()
            .any(|c| matches!(c, Call::BeginProvisioning(_) | Call::RenderPairingAid)));
    }

    #[test]
    fn test_failed_provisioning_skips_pairing_aid() {
        let mut port = FakePort::with_ssid("");
        port.fail_provisioning = true;
        let mut bootstrap = Bootstrap::new(port, ProvisionConfig::default());
        bootstrap.init();

        let port = bootstrap.into_port();
        assert!(!port.calls.contains(&Call::RenderPairingAid));
        assert!(!port.calls.contains(&Call::BeginConnection));
    }

    #[test]
    fn test_reinit_reregisters_and_rebranches() {
        let port = FakePort::with_ssid("HomeNet");
        let mut bootstrap = Bootstrap::new(port, ProvisionConfig::default());
        bootstrap.init();
        bootstrap.init();

        let port = bootstrap.into_port();
        let subscribes = port.calls.iter().filter(|c| **c == Call::Subscribe).count();
        let connects = port
            .calls
            .iter()
            .filter(|c| **c == Call::BeginConnection)
            .count();
        assert_eq!(subscribes, 2);
        assert_eq!(connects, 2);
    }

    #[test]
    fn test_wait_returns_after_exact_poll_count() {
        let mut port = FakePort::with_ssid("HomeNet");
        port.connect_after = 3;
        let mut bootstrap = short_poll(Bootstrap::new(port, ProvisionConfig::default()));
        bootstrap.wait_for_connection();

        let port = bootstrap.into_port();
        assert_eq!(port.polls.get(), 3);
    }

    #[test]
    fn test_wait_polls_at_least_once_when_already_connected() {
        let port = FakePort::with_ssid("HomeNet");
        let mut bootstrap = short_poll(Bootstrap::new(port, ProvisionConfig::default()));
        bootstrap.wait_for_connection();

        let port = bootstrap.into_port();
        assert_eq!(port.polls.get(), 1);
    }

    #[test]
    fn test_wait_after_provisioning_scenario() {
        // Full scenario: provision, events fire, status flips on poll 3.
        let mut port = FakePort::with_ssid("");
        port.connect_after = 3;
        let mut bootstrap = short_poll(Bootstrap::new(port, ProvisionConfig::default()));
        bootstrap.init();
        bootstrap.wait_for_connection();

        let port = bootstrap.into_port();
        assert!(matches!(port.calls[2], Call::BeginProvisioning(_)));
        assert_eq!(port.polls.get(), 3);
    }
}
