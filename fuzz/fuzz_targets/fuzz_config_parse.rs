//! Fuzz target: `SystemConfig::from_json`
//!
//! Feeds arbitrary bytes through the config loader and verifies:
//! - No panics on malformed JSON, wrong types or oversized strings
//! - Any config that loads also passes `validate()`
//! - Topics built from an accepted base never exceed their capacity silently
//!
//! cargo fuzz run fuzz_config_parse

#![no_main]

use firewatch::config::SystemConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(cfg) = SystemConfig::from_json(text) {
        assert!(cfg.validate().is_ok());
        assert!(cfg.measurement_interval_ms() >= 1000);
        let topic = cfg.mqtt.topic("status");
        assert!(topic.starts_with(cfg.mqtt.base_topic.as_str()));
    }
});
