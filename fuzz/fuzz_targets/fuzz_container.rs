#![no_main]

use libfuzzer_sys::fuzz_target;
use quartet_format::{demux, Report};

fuzz_target!(|data: &[u8]| {
    let mut report = Report::default();
    if let Ok(Some(bundle)) = demux(data, &mut report) {
        assert!(bundle.instrument_set.len() <= data.len());
        assert!(bundle.songs.iter().all(|s| s.len() <= data.len()));
    }
});
