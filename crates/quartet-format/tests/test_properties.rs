//! Property tests: arbitrary input never panics, well-formed input survives
//! analysis unchanged.

use proptest::prelude::*;
use quartet_format::container::mux_4q;
use quartet_format::song::{build_song, Command, SequenceEvent, SongHeader};
use quartet_format::vset::build_bank;
use quartet_format::{analyze_instrument_set, demux, validate_song, AnalyzeOptions, Report};

fn ev(command: Command, length: u16, param: u32) -> SequenceEvent {
    SequenceEvent {
        index: 0,
        command,
        length,
        step: if command == Command::Play { 0x0001_0000 } else { 0 },
        param,
    }
}

fn header(tempo: u16) -> SongHeader {
    SongHeader {
        rate_khz: 8,
        measure: 64,
        tempo,
        time_signature: (4, 4),
        reserved: [0; 8],
    }
}

/// Bank fixtures: (pcm length, loop length) for 1..=8 instruments.
fn bank_layout() -> impl Strategy<Value = Vec<(usize, u16)>> {
    prop::collection::vec(
        (1usize..600).prop_flat_map(|len| (Just(len), 0..=len as u16)),
        1..=8,
    )
}

fn build(layout: &[(usize, u16)]) -> Vec<u8> {
    let pcms: Vec<Vec<u8>> = layout.iter().map(|&(len, _)| vec![0x80; len]).collect();
    let entries: Vec<(&str, &[u8], u16)> = layout
        .iter()
        .zip(&pcms)
        .map(|(&(_, lp), pcm)| ("SAMPLE", pcm.as_slice(), lp))
        .collect();
    build_bank(8, &entries)
}

proptest! {
    #[test]
    fn arbitrary_bank_bytes_never_panic(data in prop::collection::vec(any::<u8>(), 0..2048)) {
        let _ = analyze_instrument_set(&data, &AnalyzeOptions::default());
        let _ = analyze_instrument_set(&data, &AnalyzeOptions::fix());
    }

    #[test]
    fn arbitrary_bank_header_never_panics(
        count in 1u8..=20,
        offsets in prop::collection::vec(any::<u32>(), 20),
        body in prop::collection::vec(any::<u8>(), 0..1024),
    ) {
        let mut data = vec![0u8; 222];
        data[0] = 8;
        data[1] = count + 1;
        for (i, off) in offsets.iter().enumerate() {
            data[142 + 4 * i..146 + 4 * i].copy_from_slice(&(off % 1400).to_be_bytes());
        }
        data.extend_from_slice(&body);
        if let Ok((set, _)) = analyze_instrument_set(&data, &AnalyzeOptions::default()) {
            prop_assert!(set.instrument_count() >= count as usize);
            let _ = set.to_bytes();
        }
    }

    #[test]
    fn arbitrary_song_bytes_never_panic(data in prop::collection::vec(any::<u8>(), 0..1024)) {
        let _ = validate_song(&data, None);
        let _ = validate_song(&data, Some(4));
    }

    #[test]
    fn arbitrary_container_bytes_never_panic(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let mut report = Report::default();
        let _ = demux(&data, &mut report);
    }

    #[test]
    fn well_formed_banks_are_clean(layout in bank_layout()) {
        let data = build(&layout);
        let (set, report) = analyze_instrument_set(&data, &AnalyzeOptions::default()).unwrap();
        prop_assert_eq!(set.instrument_count(), layout.len());
        prop_assert!(!report.is_modified());
        prop_assert_eq!(set.to_bytes(), data);
    }

    #[test]
    fn lost_count_is_fully_recovered(layout in bank_layout()) {
        let mut data = build(&layout);
        data[1] = 2;
        let (set, report) = analyze_instrument_set(&data, &AnalyzeOptions::default()).unwrap();
        prop_assert_eq!(set.instrument_count(), layout.len());
        prop_assert_eq!(report.fixes.len(), layout.len() - 1);
        prop_assert_eq!(set.to_bytes(), build(&layout));
    }

    #[test]
    fn loop_ticks_multiply(tempo in 4u16..=40, rows in 1u16..16, count in 1u32..64) {
        let body = [
            ev(Command::Voice, 0, 0),
            ev(Command::LoopStart, 0, 0),
            ev(Command::Play, tempo * rows, 0),
            ev(Command::LoopEnd, 0, (count - 1) << 16),
            ev(Command::End, 0, 0),
        ];
        let end = [ev(Command::End, 0, 0)];
        let data = build_song(&header(tempo), &[&body, &end, &end, &end]);
        let (song, report) = validate_song(&data, Some(1)).unwrap();
        prop_assert_eq!(song.ticks, (tempo as u64) * (rows as u64) * (count as u64));
        prop_assert!(!report.is_modified());
    }

    #[test]
    fn four_q_demuxes_to_its_parts(
        song in prop::collection::vec(any::<u8>(), 0..128),
        set in prop::collection::vec(any::<u8>(), 0..128),
        info in prop::collection::vec(any::<u8>(), 1..64),
    ) {
        let data = mux_4q(&song, &set, &info);
        let mut report = Report::default();
        let bundle = demux(&data, &mut report).unwrap().unwrap();
        prop_assert_eq!(bundle.songs[0], &song[..]);
        prop_assert_eq!(bundle.instrument_set, &set[..]);
        prop_assert_eq!(bundle.info, Some(&info[..]));
    }
}
