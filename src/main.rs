//! Wi-Fi bootstrap firmware binary.
//!
//! - **ESP32**: `cargo espflash flash --bin bootstrap --features esp32 --release`
//! - **Host**: the binary is a stub; run `cargo test` for the host suite.

#[cfg(feature = "esp32")]
fn main() {
    // Link ESP-IDF patches (must be first!)
    esp_idf_sys::link_patches();

    // Initialize ESP-IDF logger for log crate integration
    esp_idf_svc::log::EspLogger::initialize_default();

    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use std::time::Duration;
    use wifi_bootstrap_esp32::{Bootstrap, EspWifiPort, ProvisionConfig};

    log::info!("=== Wi-Fi bootstrap starting ===");

    let peripherals = Peripherals::take().expect("Failed to take peripherals");
    let sysloop = EspSystemEventLoop::take().expect("Failed to take system event loop");
    let nvs = EspDefaultNvsPartition::take().expect("Failed to take NVS partition");

    let port =
        EspWifiPort::new(peripherals.modem, sysloop, nvs).expect("Failed to initialize Wi-Fi");

    let mut bootstrap = Bootstrap::new(port, ProvisionConfig::default());
    bootstrap.init();
    bootstrap.wait_for_connection();

    log::info!("Entering main loop");
    loop {
        std::thread::sleep(Duration::from_secs(2));
        log::debug!("Heartbeat");
    }
}

#[cfg(not(feature = "esp32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    println!("This binary requires the 'esp32' feature.");
    println!("Use 'cargo test' for host testing.");
}
