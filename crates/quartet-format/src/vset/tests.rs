use pretty_assertions::assert_eq;

use super::sample_header::tests::avr_bytes;
use super::*;
use crate::error::QuartetError;

fn pcm(len: usize) -> Vec<u8> {
    vec![0x80; len]
}

fn two_instruments() -> Vec<u8> {
    build_bank(8, &[("LEAD", &pcm(16), 0), ("BASS", &pcm(32), 8)])
}

fn set_count(data: &mut [u8], count: u8) {
    data[1] = count + 1;
}

fn set_offset(data: &mut [u8], slot: usize, offset: u32) {
    let at = 142 + 4 * slot;
    data[at..at + 4].copy_from_slice(&offset.to_be_bytes());
}

fn bank_with_avr(avr: &[u8]) -> Vec<u8> {
    let mut data = vec![0u8; VsetHeader::SIZE];
    data[0] = 8;
    data[1] = 2;
    data[2..9].copy_from_slice(b"SNARE  ");
    set_offset(&mut data, 0, 342);
    data.extend_from_slice(&avr[..SAMPLE_HEADER_SNIFF]);
    data.extend_from_slice(&InstrumentPrefix::new(16, 0).to_vec());
    data.extend_from_slice(&pcm(16));
    data
}

fn analyze(data: &[u8]) -> (InstrumentSet, Report) {
    analyze_instrument_set(data, &AnalyzeOptions::default()).unwrap()
}

#[test]
fn test_clean_bank_has_empty_fix_log() {
    let data = two_instruments();
    let (set, report) = analyze(&data);
    assert_eq!(set.instrument_count(), 2);
    assert_eq!(set.rate_khz, 8);
    assert!(report.fixes.is_empty());
    assert!(report.warnings.is_empty());
    assert_eq!(set.to_bytes(), data);
}

#[test]
fn test_concrete_single_instrument() {
    let mut data = vec![0u8; 246];
    data[0] = 8;
    data[1] = 2;
    data[2..9].copy_from_slice(b"LEAD   ");
    set_offset(&mut data, 0, 222);
    data[226..230].copy_from_slice(&0x0010_0000u32.to_be_bytes());

    let (set, report) = analyze(&data);
    let inst = set.slot(0).unwrap();
    assert_eq!((inst.addr, inst.size, inst.loop_len), (230, 16, 0));
    assert!(report.fixes.is_empty());
    assert_eq!(set.pcm(0).map(<[u8]>::len), Some(16));

    let err = analyze_instrument_set(&data[..244], &AnalyzeOptions::default()).unwrap_err();
    assert!(matches!(err, QuartetError::Format { .. }));
}

#[test]
fn test_lost_count_is_rediscovered() {
    let mut data = two_instruments();
    set_count(&mut data, 1);

    let (set, report) = analyze(&data);
    assert_eq!(set.declared_count, 1);
    assert_eq!(set.instrument_count(), 2);
    assert_eq!(report.fixes.len(), 1);
    assert_eq!(
        report.fixes[0].message,
        "Added I#01 'BASS  ' [000254+000032-000008] -"
    );

    let repaired = set.to_bytes();
    assert_eq!(repaired[1], 3);
    let (again, report) = analyze(&repaired);
    assert_eq!(again.instrument_count(), 2);
    assert!(report.fixes.is_empty());
}

#[test]
fn test_wiped_offset_entry_is_rediscovered() {
    let mut data = two_instruments();
    set_count(&mut data, 1);
    set_offset(&mut data, 1, 0);

    let (set, report) = analyze(&data);
    let added: Vec<_> = report
        .fixes
        .iter()
        .filter(|f| f.message.starts_with("Added"))
        .collect();
    assert_eq!(added.len(), 1);
    assert_eq!(set.slot(1).map(|i| i.addr), Some(254));

    let repaired = set.to_bytes();
    assert_eq!(&repaired[146..150], &246u32.to_be_bytes());
    let (_, report) = analyze(&repaired);
    assert!(report.fixes.is_empty());
}

#[test]
fn test_out_of_order_slots_keep_their_hints() {
    let mut data = build_bank(
        8,
        &[("AAA", &pcm(40), 0), ("CCC", &pcm(60), 0), ("BBB", &pcm(50), 0)],
    );
    // Slot 2 is stored before slot 1.
    data[9..16].copy_from_slice(b"BBB    ");
    data[16..23].copy_from_slice(b"CCC    ");
    set_offset(&mut data, 1, 0);
    set_offset(&mut data, 2, 270);
    set_count(&mut data, 1);

    let (set, report) = analyze(&data);
    assert_eq!(set.instrument_count(), 3);
    let two = set.slot(2).unwrap();
    assert_eq!((two.addr, two.size, two.display_name()), (278, 60, "CCC".to_string()));
    let one = set.slot(1).unwrap();
    assert_eq!((one.addr, one.size, one.display_name()), (346, 50, "BBB".to_string()));

    assert_eq!(report.fixes.len(), 2);
    assert!(report.fixes[0].message.starts_with("Added I#02"));
    assert!(report.fixes[1].message.starts_with("Added I#01"));
}

#[test]
fn test_lost_instrument_behind_sample_header_is_rediscovered() {
    let mut data = build_bank(8, &[("LEAD", &pcm(40), 0)]);
    data[9..16].copy_from_slice(b"SNARE  ");
    data.extend_from_slice(&avr_bytes()[..SAMPLE_HEADER_SNIFF]);
    data.extend_from_slice(&InstrumentPrefix::new(16, 0).to_vec());
    data.extend_from_slice(&pcm(16));

    let (set, report) = analyze(&data);
    let inst = set.slot(1).unwrap();
    assert_eq!(inst.addr, 398);
    assert_eq!(inst.region_start(), 270);
    assert!(inst.sample_header.is_present());

    assert_eq!(report.fixes.len(), 1);
    let message = &report.fixes[0].message;
    assert!(message.starts_with("Added I#01"));
    assert!(message.ends_with("AVR<u8x1 000016-000000 @8084>"));

    let (again, report) = analyze(&set.to_bytes());
    assert_eq!(again.slot(1).map(|i| i.region_start()), Some(270));
    assert!(report.fixes.is_empty());
}

#[test]
fn test_overlap_is_fatal() {
    let mut data = two_instruments();
    // I#00 claims 24 bytes and runs over the prefix of I#01.
    data[226..230].copy_from_slice(&0x0018_0000u32.to_be_bytes());

    let err = analyze_instrument_set(&data, &AnalyzeOptions::default()).unwrap_err();
    assert_eq!(err.code(), "QUARTET_002");
    match err {
        QuartetError::Overlap {
            overlap,
            previous,
            current,
        } => {
            assert_eq!(overlap, 8);
            assert_eq!(previous, "I#00 000222:000254 +32");
            assert_eq!(current, "I#01 000246:000286 +40");
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_duplicates_warn_and_stay() {
    let mut data = build_bank(8, &[("LEAD", &pcm(16), 0)]);
    set_count(&mut data, 2);
    set_offset(&mut data, 1, 222);

    let (set, report) = analyze(&data);
    assert_eq!(set.instrument_count(), 2);
    assert!(report.fixes.is_empty());
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].message, "I#00 and I#01 are duplicates");
}

#[test]
fn test_small_gap_is_left_alone() {
    let mut data = build_bank(8, &[("LEAD", &pcm(16), 0)]);
    data.extend_from_slice(&pcm(20));
    let (set, report) = analyze(&data);
    assert_eq!(set.instrument_count(), 1);
    assert!(report.fixes.is_empty());
}

#[test]
fn test_embedded_sample_header() {
    let data = bank_with_avr(&avr_bytes());
    let (set, report) = analyze(&data);
    let inst = set.slot(0).unwrap();
    assert!(inst.sample_header.is_present());
    assert_eq!(inst.region_start(), 222);
    assert_eq!(inst.sample_header.header().map(|h| h.sample_rate), Some(8084));
    assert!(inst.to_string().ends_with("AVR<u8x1 000016-000000 @8084>"));
    assert!(report.fixes.is_empty());
    assert!(report.warnings.is_empty());
}

#[test]
fn test_near_miss_signature_is_ignored() {
    let mut avr = avr_bytes();
    avr[0] = b'X';
    let data = bank_with_avr(&avr);
    let (set, report) = analyze(&data);
    assert_eq!(
        set.slot(0).map(|i| &i.sample_header),
        Some(&SampleHeaderState::NearMiss)
    );
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].subject, "I#00");
    assert!(report.fixes.is_empty());
}

#[test]
fn test_invalid_header_is_dropped_in_check_mode() {
    let mut avr = avr_bytes();
    avr[12..14].copy_from_slice(&0xFFFFu16.to_be_bytes());
    let data = bank_with_avr(&avr);
    let (set, report) = analyze(&data);
    assert_eq!(
        set.slot(0).map(|i| &i.sample_header),
        Some(&SampleHeaderState::Absent)
    );
    assert_eq!(
        report.warnings[0].message,
        "sample header: AVR invalid chans -- 2"
    );
    assert!(report.fixes.is_empty());
}

#[test]
fn test_fix_mode_rewrites_sample_header() {
    let mut avr = avr_bytes();
    avr[12..14].copy_from_slice(&0xFFFFu16.to_be_bytes());
    let data = bank_with_avr(&avr);

    let (set, report) = analyze_instrument_set(&data, &AnalyzeOptions::fix()).unwrap();
    assert!(set.slot(0).unwrap().sample_header.is_present());
    assert_eq!(report.fixes.len(), 1);
    assert_eq!(report.fixes[0].subject, "I#00");

    let repaired = set.to_bytes();
    assert_eq!(&repaired[234..236], &[0, 0]);
    assert_eq!(&repaired[342..], &data[342..]);
    let (_, report) = analyze_instrument_set(&repaired, &AnalyzeOptions::fix()).unwrap();
    assert!(report.fixes.is_empty());
}

#[test]
fn test_odd_buffer_saved_by_alignment() {
    let mut data = build_bank(8, &[("LEAD", &pcm(16), 0)]);
    data.pop();
    let (set, report) = analyze(&data);
    assert_eq!(set.instrument_count(), 1);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].message, "I#00 saved by alignment");
    assert_eq!(set.pcm(0).map(<[u8]>::len), Some(15));
}

#[test]
fn test_broken_declared_slot_is_fatal() {
    let mut data = two_instruments();
    set_offset(&mut data, 1, 5000);
    let err = analyze_instrument_set(&data, &AnalyzeOptions::default()).unwrap_err();
    assert_eq!(err.structure(), crate::Structure::Instrument);
}

#[test]
fn test_bad_header_is_fatal() {
    let mut data = two_instruments();
    data[0] = 3;
    assert!(analyze_instrument_set(&data, &AnalyzeOptions::default()).is_err());
    assert!(analyze_instrument_set(&data[..100], &AnalyzeOptions::default()).is_err());
}

#[test]
fn test_summary_lists_instruments() {
    let (set, _) = analyze(&two_instruments());
    let summary = set.summary();
    assert_eq!(summary.instrument_count, 2);
    assert_eq!(summary.instruments[1].display_name(), "BASS");
    assert_eq!(summary.size, 286);
}
