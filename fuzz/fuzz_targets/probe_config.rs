#![no_main]

use fsprobe::config::ProbeConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(config) = ProbeConfig::from_toml_str(input) {
            let _ = config.payload();
        }
    }
});
