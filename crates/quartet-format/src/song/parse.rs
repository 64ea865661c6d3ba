//! Song buffer decoding.

use super::channel::Channel;
use super::event::{Command, SequenceEvent, SequenceRecord};
use super::header::SongHeader;
use crate::codec::FixedRecord;
use crate::error::{QuartetError, QuartetResult, Structure};
use crate::report::Report;
use crate::{NUM_CHANNELS, SEQUENCE_RECORD_SIZE, SONG_HEADER_SIZE};

/// Decode the header and the four channel programs.
///
/// One undecodable record per channel is dropped and logged as a fix; a
/// second one in the same channel is fatal. Records whose unused fields are
/// not zero are cleaned and logged. Channels left without an End command
/// get one.
pub(super) fn parse(
    data: &[u8],
    report: &mut Report,
) -> QuartetResult<(SongHeader, [Channel; NUM_CHANNELS])> {
    let len = data.len();
    if len < SONG_HEADER_SIZE + NUM_CHANNELS * SEQUENCE_RECORD_SIZE {
        return Err(QuartetError::format(
            Structure::Song,
            format!("invalid song (too few data) -- {} bytes", len),
        ));
    }

    let header = SongHeader::decode(data)?;
    header.validate(report)?;

    let mut channels: [Channel; NUM_CHANNELS] = std::array::from_fn(Channel::new);
    let mut k = 0;
    let mut strikes = 0;
    let mut offset = SONG_HEADER_SIZE;

    while offset + SEQUENCE_RECORD_SIZE <= len {
        let record = SequenceRecord::decode_at(data, offset)?;
        let chan = &mut channels[k];
        chan.offset.get_or_insert(offset);
        let index = chan.events.len();

        match SequenceEvent::from_record(record, index) {
            Ok(event) => {
                if event.to_record() != record {
                    report.fix(format!("cleaned unused fields -- {}{}", chan.tag(), event));
                }
                chan.events.push(event);
                offset += SEQUENCE_RECORD_SIZE;
                if event.command == Command::End {
                    tracing::trace!(
                        channel = %chan.tag(),
                        events = chan.events.len(),
                        "channel closed"
                    );
                    k += 1;
                    strikes = 0;
                    if k == NUM_CHANNELS {
                        break;
                    }
                }
            }
            Err(err) => {
                strikes += 1;
                if strikes > 1 {
                    return Err(QuartetError::SequenceCorrupt {
                        channel: chan.tag(),
                        offset,
                        size: len,
                        source: Box::new(err),
                    });
                }
                report.fix(format!(
                    "{}[{}/{}] {}, record dropped",
                    chan.tag(),
                    offset,
                    len,
                    err
                ));
                offset += SEQUENCE_RECORD_SIZE;
            }
        }
    }

    for chan in channels.iter_mut() {
        if !chan.is_closed() {
            report.fix(format!("closing channel {}", chan.tag()));
            chan.close();
        }
    }

    if offset != len {
        report.warn_at(
            format!("{} garbage bytes at end of song", len - offset),
            Some(offset),
        );
    }

    Ok((header, channels))
}
