//! Channel program records.
//!
//! A record is 12 bytes: `command:u16` (an ASCII letter), `length:u16`,
//! `step:u32` (16.16 pitch ratio) and `parameter:u32`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::{put_u16, put_u32, FixedRecord, Reader};
use crate::error::{QuartetError, QuartetResult, Structure};
use crate::SEQUENCE_RECORD_SIZE;

/// Lowest playable note, in 1/256 semitones.
pub const NOTE_MIN: i32 = -30 * 256;

/// Highest playable note, in 1/256 semitones.
pub const NOTE_MAX: i32 = 30 * 256;

/// Raw 12-byte record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceRecord {
    pub command: u16,
    pub length: u16,
    pub step: u32,
    pub param: u32,
}

impl FixedRecord for SequenceRecord {
    const SIZE: usize = SEQUENCE_RECORD_SIZE;
    const STRUCTURE: Structure = Structure::Sequence;

    fn decode(data: &[u8]) -> QuartetResult<Self> {
        let mut r = Reader::new(data, Self::STRUCTURE);
        Ok(Self {
            command: r.u16()?,
            length: r.u16()?,
            step: r.u32()?,
            param: r.u32()?,
        })
    }

    fn encode(&self, out: &mut Vec<u8>) {
        put_u16(out, self.command);
        put_u16(out, self.length);
        put_u32(out, self.step);
        put_u32(out, self.param);
    }
}

/// Channel program command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// `P`: play a note.
    Play,
    /// `R`: silence.
    Rest,
    /// `S`: pitch slide.
    Slide,
    /// `V`: select an instrument.
    Voice,
    /// `l`: open a loop.
    LoopStart,
    /// `L`: close a loop.
    LoopEnd,
    /// `F`: end of the channel program.
    End,
}

impl Command {
    /// All commands.
    pub const ALL: [Command; 7] = [
        Command::Play,
        Command::Rest,
        Command::Slide,
        Command::Voice,
        Command::LoopStart,
        Command::LoopEnd,
        Command::End,
    ];

    /// Command letter.
    pub fn letter(self) -> char {
        match self {
            Command::Play => 'P',
            Command::Rest => 'R',
            Command::Slide => 'S',
            Command::Voice => 'V',
            Command::LoopStart => 'l',
            Command::LoopEnd => 'L',
            Command::End => 'F',
        }
    }

    /// On-disk command word.
    pub fn code(self) -> u16 {
        self.letter() as u16
    }

    /// Command for an on-disk word.
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    /// Whether the command advances time by its length.
    pub fn is_timed(self) -> bool {
        matches!(self, Command::Play | Command::Rest | Command::Slide)
    }
}

/// Convert a 16.16 step ratio to a note in 1/256 semitones.
pub fn step_to_note(step: u32) -> Option<i32> {
    if step == 0 {
        return None;
    }
    let semis = (step as f64 / 65536.0).log2() * 12.0 * 256.0;
    Some(semis.round() as i32)
}

/// Convert a note in 1/256 semitones to a 16.16 step ratio.
pub fn note_to_step(note: i32) -> u32 {
    (2f64.powf(note as f64 / (256.0 * 12.0)) * 65536.0).round() as u32
}

/// One decoded, validated and cleaned command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceEvent {
    /// Position in the channel program.
    pub index: usize,
    pub command: Command,
    pub length: u16,
    pub step: u32,
    pub param: u32,
}

impl SequenceEvent {
    /// Build an event with all fields zero.
    pub fn new(index: usize, command: Command) -> Self {
        Self {
            index,
            command,
            length: 0,
            step: 0,
            param: 0,
        }
    }

    /// Decode a raw record, then validate and clean it.
    pub fn from_record(record: SequenceRecord, index: usize) -> QuartetResult<Self> {
        let command = Command::from_code(record.command).ok_or_else(|| {
            let printable = char::from_u32(record.command as u32)
                .filter(|c| c.is_ascii_graphic())
                .unwrap_or('?');
            QuartetError::UnknownCommand {
                code: record.command,
                printable,
            }
        })?;
        let mut event = Self {
            index,
            command,
            length: record.length,
            step: record.step,
            param: record.param,
        };
        event.check()?;
        event.clean();
        Ok(event)
    }

    /// Validate the fields relevant to the command.
    pub fn check(&self) -> QuartetResult<()> {
        match self.command {
            Command::Play => {
                self.check_length("Play")?;
                let note = step_to_note(self.step)
                    .filter(|n| n & 255 == 0 && (NOTE_MIN..=NOTE_MAX).contains(n));
                if note.is_none() {
                    return Err(QuartetError::invalid_event(format!(
                        "Invalid \"P\"lay step -- {:08x}",
                        self.step
                    )));
                }
            }
            Command::Rest => self.check_length("Rest")?,
            Command::Slide => self.check_length("Slide")?,
            Command::Voice => {
                if self.param & !(31 * 4) != 0 {
                    return Err(QuartetError::invalid_event(format!(
                        "Invalid \"V\"oice parameter -- {:08x}",
                        self.param
                    )));
                }
                if self.param > 20 * 4 {
                    return Err(QuartetError::invalid_event(format!(
                        "Invalid \"V\"oice number -- {}",
                        self.param >> 2
                    )));
                }
            }
            Command::LoopStart | Command::LoopEnd | Command::End => {}
        }
        Ok(())
    }

    fn check_length(&self, what: &str) -> QuartetResult<()> {
        if self.length == 0 {
            return Err(QuartetError::invalid_event(format!(
                "Invalid \"{}\"{} length -- {:04x}",
                &what[..1],
                &what[1..],
                self.length
            )));
        }
        Ok(())
    }

    /// Zero the fields the command does not use.
    pub fn clean(&mut self) {
        match self.command {
            Command::Play => self.param = 0,
            Command::Rest => {
                self.step = 0;
                self.param = 0;
            }
            Command::Slide => {}
            Command::Voice => {
                self.length = 0;
                self.step = 0;
            }
            Command::LoopStart | Command::End => {
                self.length = 0;
                self.step = 0;
                self.param = 0;
            }
            Command::LoopEnd => {
                self.length = 0;
                self.step = 0;
                self.param &= 0xFFFF_0000;
            }
        }
    }

    /// Number of times a loop body runs, for `LoopEnd`.
    pub fn repeat_count(&self) -> u32 {
        (self.param >> 16) + 1
    }

    /// Instrument slot selected by a `Voice`.
    pub fn voice(&self) -> usize {
        (self.param / 4) as usize
    }

    /// Note of a `Play`, in 1/256 semitones.
    pub fn note(&self) -> Option<i32> {
        step_to_note(self.step)
    }

    /// Raw record of the event.
    pub fn to_record(&self) -> SequenceRecord {
        SequenceRecord {
            command: self.command.code(),
            length: self.length,
            step: self.step,
            param: self.param,
        }
    }
}

impl fmt::Display for SequenceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:05}] {} {:04X} {:08X} {:04X}-{:04X}",
            self.index,
            self.command.letter(),
            self.length,
            self.step,
            self.param >> 16,
            self.param & 0xFFFF
        )
    }
}
