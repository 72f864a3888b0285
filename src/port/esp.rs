//! ESP-IDF implementation of the Wi-Fi platform port.
//!
//! Wraps the ESP-IDF Wi-Fi driver for the station side and the ESP-IDF
//! provisioning manager (BLE scheme) for the provisioning side. Credential
//! persistence is the driver's own NVS handling; this module never touches
//! storage directly.

use std::ffi::{c_void, CString};
use std::ptr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::{EspSubscription, EspSystemEventLoop, System};
use esp_idf_svc::netif::IpEvent;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{Configuration, EspWifi, WifiEvent};
use esp_idf_sys::{self as sys, EspError};

use super::{ConnStatus, PortError, WifiPort};
use crate::config::ProvisionConfig;
use crate::event::{EventHandler, StackEvent};
use crate::qr;

// Phase shadow, updated from event callbacks. The driver's own link state
// takes precedence when it reports connected.
const PHASE_UNINIT: u8 = 0;
const PHASE_PROVISIONING: u8 = 1;
const PHASE_CRED_PENDING: u8 = 2;
const PHASE_DISCONNECTED: u8 = 3;
const PHASE_CONNECTED: u8 = 4;

fn phase_status(phase: u8) -> ConnStatus {
    match phase {
        PHASE_PROVISIONING => ConnStatus::Provisioning,
        PHASE_CRED_PENDING => ConnStatus::CredentialsPending,
        PHASE_DISCONNECTED => ConnStatus::Disconnected,
        PHASE_CONNECTED => ConnStatus::Connected,
        _ => ConnStatus::Uninitialized,
    }
}

/// Context handed to the provisioning manager's app event callback.
///
/// The manager keeps the service name, POP, and UUID pointers for as long
/// as a session can run, and the callback can fire until then, so this is
/// leaked once per provisioning start and never freed.
struct ProvCtx {
    handler: EventHandler,
    phase: Arc<AtomicU8>,
    uuid: [u8; 16],
    pop: CString,
    service_name: CString,
    service_key: Option<CString>,
}

unsafe extern "C" fn prov_event_trampoline(
    user_data: *mut c_void,
    event: sys::wifi_prov_cb_event_t,
    _event_data: *mut c_void,
) {
    if user_data.is_null() {
        return;
    }
    let ctx = &*(user_data as *const ProvCtx);
    let mapped = match event {
        sys::wifi_prov_cb_event_t_WIFI_PROV_START => {
            ctx.phase.store(PHASE_PROVISIONING, Ordering::Relaxed);
            StackEvent::ProvStarted
        }
        sys::wifi_prov_cb_event_t_WIFI_PROV_CRED_RECV => {
            ctx.phase.store(PHASE_CRED_PENDING, Ordering::Relaxed);
            StackEvent::ProvCredentialsReceived
        }
        sys::wifi_prov_cb_event_t_WIFI_PROV_CRED_FAIL => StackEvent::ProvCredentialsFailed,
        sys::wifi_prov_cb_event_t_WIFI_PROV_CRED_SUCCESS => StackEvent::ProvCredentialsOk,
        sys::wifi_prov_cb_event_t_WIFI_PROV_END => StackEvent::ProvEnded,
        other => StackEvent::Other(other as i32),
    };
    (ctx.handler)(&mapped);
}

/// Platform port over ESP-IDF.
pub struct EspWifiPort<'a> {
    wifi: EspWifi<'a>,
    sysloop: EspSystemEventLoop,
    phase: Arc<AtomicU8>,
    handler: Option<EventHandler>,
    // Keep-alive: dropping a subscription unregisters it.
    _wifi_sub: Option<EspSubscription<'static, System>>,
    _ip_sub: Option<EspSubscription<'static, System>>,
}

impl<'a> EspWifiPort<'a> {
    /// Create the port.
    ///
    /// The NVS partition is handed to the Wi-Fi driver so credentials
    /// accepted during provisioning persist across reboots.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
    ) -> Result<Self, EspError> {
        let wifi = EspWifi::new(modem, sysloop.clone(), Some(nvs))?;
        Ok(Self {
            wifi,
            sysloop,
            phase: Arc::new(AtomicU8::new(PHASE_UNINIT)),
            handler: None,
            _wifi_sub: None,
            _ip_sub: None,
        })
    }
}

impl<'a> WifiPort for EspWifiPort<'a> {
    fn subscribe(&mut self, handler: EventHandler) -> Result<(), PortError> {
        let phase = self.phase.clone();
        let h = handler.clone();
        let wifi_sub = self.sysloop.subscribe::<WifiEvent, _>(move |event| {
            if let WifiEvent::StaDisconnected(_) = event {
                phase.store(PHASE_DISCONNECTED, Ordering::Relaxed);
                h(&StackEvent::StaDisconnected);
            }
        })?;

        let phase = self.phase.clone();
        let h = handler.clone();
        let ip_sub = self.sysloop.subscribe::<IpEvent, _>(move |event| {
            if let IpEvent::DhcpIpAssigned(assignment) = event {
                phase.store(PHASE_CONNECTED, Ordering::Relaxed);
                h(&StackEvent::StaGotIp(assignment.ip()));
            }
        })?;

        self._wifi_sub = Some(wifi_sub);
        self._ip_sub = Some(ip_sub);
        self.handler = Some(handler);
        Ok(())
    }

    fn stored_ssid(&mut self) -> String {
        // The driver restores its station configuration from NVS; a blank
        // SSID there means the device was never provisioned.
        match self.wifi.get_configuration() {
            Ok(Configuration::Client(client)) => client.ssid.as_str().to_string(),
            Ok(Configuration::Mixed(client, _)) => client.ssid.as_str().to_string(),
            _ => String::new(),
        }
    }

    fn begin_provisioning(&mut self, config: &ProvisionConfig) -> Result<(), PortError> {
        let handler = self
            .handler
            .clone()
            .ok_or(PortError::InvalidState("subscribe before provisioning"))?;

        let service_name = CString::new(config.service_name.as_str())
            .map_err(|_| PortError::InvalidState("service name contains NUL"))?;
        let pop = CString::new(config.pop.as_str())
            .map_err(|_| PortError::InvalidState("POP contains NUL"))?;
        let service_key = config
            .service_key
            .as_deref()
            .map(CString::new)
            .transpose()
            .map_err(|_| PortError::InvalidState("service key contains NUL"))?;

        let ctx = Box::into_raw(Box::new(ProvCtx {
            handler,
            phase: self.phase.clone(),
            uuid: config.device_uuid,
            pop,
            service_name,
            service_key,
        }));

        unsafe {
            let mgr_config = sys::wifi_prov_mgr_config_t {
                scheme: sys::wifi_prov_scheme_ble,
                // Standalone BLE: the scheme reclaims BT memory on its own
                // once provisioning finishes.
                scheme_event_handler: sys::wifi_prov_event_handler_t {
                    event_cb: Some(sys::wifi_prov_scheme_ble_event_cb_free_btdm),
                    user_data: ptr::null_mut(),
                },
                app_event_handler: sys::wifi_prov_event_handler_t {
                    event_cb: Some(prov_event_trampoline),
                    user_data: ctx as *mut c_void,
                },
            };
            sys::esp!(sys::wifi_prov_mgr_init(mgr_config))?;

            sys::esp!(sys::wifi_prov_scheme_ble_set_service_uuid(
                (*ctx).uuid.as_mut_ptr()
            ))?;

            if config.reprovision {
                sys::esp!(sys::wifi_prov_mgr_reset_provisioning())?;
            }

            let key_ptr = (*ctx)
                .service_key
                .as_ref()
                .map(|k| k.as_ptr())
                .unwrap_or(ptr::null());
            sys::esp!(sys::wifi_prov_mgr_start_provisioning(
                sys::wifi_prov_security_WIFI_PROV_SECURITY_1,
                (*ctx).pop.as_ptr() as *const c_void,
                (*ctx).service_name.as_ptr(),
                key_ptr,
            ))?;
        }

        self.phase.store(PHASE_PROVISIONING, Ordering::Relaxed);
        Ok(())
    }

    fn render_pairing_aid(&mut self, config: &ProvisionConfig) -> Result<(), PortError> {
        qr::log_pairing_aid(&config.service_name, &config.pop);
        Ok(())
    }

    fn begin_connection(&mut self) -> Result<(), PortError> {
        self.wifi.start()?;
        self.wifi.connect()?;
        self.phase.store(PHASE_CRED_PENDING, Ordering::Relaxed);
        Ok(())
    }

    fn status(&self) -> ConnStatus {
        if self.wifi.is_connected().unwrap_or(false) {
            return ConnStatus::Connected;
        }
        phase_status(self.phase.load(Ordering::Relaxed))
    }
}
