//! Fuzz target: `DeviceConfig::from_json`
//!
//! A config document that parses must also survive validation and a
//! serialize/parse cycle unchanged.
//!
//! cargo fuzz run fuzz_device_config

#![no_main]

use doorlink::config::DeviceConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(config) = DeviceConfig::from_json(text) else {
        return;
    };

    let _ = config.validate();
    let _ = config.credentials();

    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(DeviceConfig::from_json(&json).unwrap(), config);
});
