fn main() {
    // Device configuration is baked in at compile time through `option_env!`.
    for var in [
        "DOORLINK_CONFIG",
        "DOORLINK_WIFI_SSID",
        "DOORLINK_WIFI_PASS",
        "DOORLINK_REMOTE_HOST",
        "DOORLINK_REMOTE_SECRET",
    ] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
