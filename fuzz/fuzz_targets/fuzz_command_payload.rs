//! Fuzz target: inbound `{base}/cmd` payloads
//!
//! Arbitrary bytes must never panic the decoder, and only a payload that
//! trims to exactly `shutdown` may yield a command.
//!
//! cargo fuzz run fuzz_command_payload

#![no_main]

use firewatch::app::commands::AppCommand;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let parsed = AppCommand::from_payload(data);
    let exact = core::str::from_utf8(data).is_ok_and(|s| s.trim() == "shutdown");
    assert_eq!(parsed.is_some(), exact);
});
