#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(src) = std::str::from_utf8(data) {
        // Scanning arbitrary input must never panic, and every span must be
        // a valid slice of the source.
        for token in metastrip::scan::tokenize(src) {
            let _ = token.text(src);
        }
    }
});
