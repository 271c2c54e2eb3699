#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(src) = std::str::from_utf8(data) {
        // Folding arbitrary input must never panic, for either value.
        let _ = metastrip::fold::apply(src, true);
        let _ = metastrip::fold::apply(src, false);
        let _ = metastrip::transform_source(src, None);
    }
});
