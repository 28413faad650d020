#![no_main]

use fsprobe::payload::Payload;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Decoded length is always half the hex digits
        if let Ok(payload) = Payload::from_hex(input) {
            let digits = input.chars().filter(|c| !c.is_whitespace()).count();
            assert_eq!(payload.len() * 2, digits);
        }
    }
});
