fn main() {
    // The ESP-IDF build system only applies when cross-compiling for Xtensa.
    // Build scripts run on the host, so inspect the TARGET env var.
    if let Ok(target) = std::env::var("TARGET") {
        if target.contains("xtensa") {
            embuild::espidf::sysenv::output();
        }
    }
}
