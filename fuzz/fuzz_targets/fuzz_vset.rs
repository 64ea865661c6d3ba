#![no_main]

use libfuzzer_sys::fuzz_target;
use quartet_format::{analyze_instrument_set, AnalyzeOptions};

fuzz_target!(|data: &[u8]| {
    for options in [AnalyzeOptions::default(), AnalyzeOptions::fix()] {
        if let Ok((set, _)) = analyze_instrument_set(data, &options) {
            let _ = analyze_instrument_set(&set.to_bytes(), &options);
        }
    }
});
