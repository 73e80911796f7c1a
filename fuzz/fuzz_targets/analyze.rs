#![no_main]

use libfuzzer_sys::fuzz_target;
use fortest::frontend::classifier::{ClassifyOptions, classify_file};
use fortest::{analyze_source, synthesize_drivers};

fuzz_target!(|data: &[u8]| {
    // Convert bytes to UTF-8 string (ignore invalid UTF-8)
    if let Ok(s) = std::str::from_utf8(data) {
        // If analysis succeeds, the rest of the front half must not panic either
        if let Ok(analysis) = analyze_source(s) {
            let file = classify_file(std::path::Path::new("test_fuzz.f90"), analysis, ClassifyOptions::default());
            let _ = synthesize_drivers(&file);
        }
    }
});
