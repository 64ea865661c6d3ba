#![no_main]

use libfuzzer_sys::fuzz_target;
use quartet_format::validate_song;

fuzz_target!(|data: &[u8]| {
    let count = data.first().map(|&b| (b % 21) as usize);
    if let Ok((song, _)) = validate_song(data, count) {
        let _ = validate_song(&song.to_bytes(), count);
    }
});
