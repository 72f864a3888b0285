//! Pairing aid for the companion provisioning app.
//!
//! The Espressif provisioning apps accept a JSON payload encoded as a QR
//! code. This module builds that payload and renders it as a block-character
//! QR suitable for a serial console. Encoding itself is delegated to the
//! `qrcode` crate.

use log::{info, warn};
use qrcode::types::QrError;
use qrcode::QrCode;

/// Transport tag the companion app expects for BLE provisioning.
pub const TRANSPORT_BLE: &str = "ble";

/// Build the provisioning-app payload for a service.
///
/// Format: `{"ver":"v1","name":"<name>","pop":"<pop>","transport":"<t>"}`.
/// The `pop` field is omitted when the secret is empty, which the app
/// treats as security level 0.
pub fn pairing_payload(service_name: &str, pop: &str, transport: &str) -> String {
    if pop.is_empty() {
        format!(
            r#"{{"ver":"v1","name":"{}","transport":"{}"}}"#,
            service_name, transport
        )
    } else {
        format!(
            r#"{{"ver":"v1","name":"{}","pop":"{}","transport":"{}"}}"#,
            service_name, pop, transport
        )
    }
}

/// Render a payload as a console QR code.
///
/// Modules are drawn two characters wide so the code stays square in a
/// terminal font.
pub fn render_qr(payload: &str) -> Result<String, QrError> {
    let code = QrCode::new(payload)?;
    Ok(code
        .render::<char>()
        .quiet_zone(false)
        .module_dimensions(2, 1)
        .dark_color('█')
        .light_color(' ')
        .build())
}

/// Log the pairing aid for a provisioning session.
///
/// Emits the payload and the QR line by line. If encoding fails, falls back
/// to the values needed for manual entry in the companion app.
pub fn log_pairing_aid(service_name: &str, pop: &str) {
    let payload = pairing_payload(service_name, pop, TRANSPORT_BLE);
    info!("Scan with the ESP BLE Provisioning app:");
    info!("Payload: {}", payload);

    match render_qr(&payload) {
        Ok(code) => {
            for line in code.lines() {
                info!("{}", line);
            }
        }
        Err(e) => {
            warn!("QR encoding failed ({}), use manual entry", e);
            info!("Device: {}", service_name);
            if !pop.is_empty() {
                info!("POP: {}", pop);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_with_pop() {
        let payload = pairing_payload("PROV_123", "abcd1234", TRANSPORT_BLE);
        assert_eq!(
            payload,
            r#"{"ver":"v1","name":"PROV_123","pop":"abcd1234","transport":"ble"}"#
        );
    }

    #[test]
    fn test_payload_without_pop_omits_field() {
        let payload = pairing_payload("PROV_123", "", TRANSPORT_BLE);
        assert_eq!(payload, r#"{"ver":"v1","name":"PROV_123","transport":"ble"}"#);
        assert!(!payload.contains("pop"));
    }

    #[test]
    fn test_render_qr_produces_block_grid() {
        let payload = pairing_payload("PROV_123", "abcd1234", TRANSPORT_BLE);
        let code = render_qr(&payload).unwrap();
        assert!(code.contains('█'));
        // A version-1 code is 21 modules; anything plausible has more rows.
        assert!(code.lines().count() >= 21);
    }

    #[test]
    fn test_render_qr_rejects_oversized_payload() {
        // Past the byte capacity of the largest QR version.
        let huge = "x".repeat(8000);
        assert!(render_qr(&huge).is_err());
    }
}
