//! Channel program replay.
//!
//! Each channel is replayed once with a loop stack. Timed commands add their
//! length to the innermost open loop (or the channel when no loop is open);
//! closing a loop folds `repeat * body` into the enclosing scope.

use std::fmt;

use super::channel::Channel;
use super::event::{Command, SequenceEvent};
use crate::error::{QuartetError, QuartetResult};
use crate::report::Report;
use crate::MAX_SLOTS;

/// An open loop during replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopFrame {
    /// Index of the LoopStart event (0 for an implicit loop).
    pub start: usize,
    /// Index of the LoopEnd event, once closed.
    pub end: Option<usize>,
    /// Times the body runs, taken from the LoopEnd count.
    pub repeat: u32,
    /// Ticks accumulated by one run of the body.
    pub ticks: u64,
}

impl LoopFrame {
    fn open(start: usize) -> Self {
        Self {
            start,
            ..Self::default()
        }
    }

    /// Ticks of the whole loop, all repetitions included.
    pub fn total(&self) -> u64 {
        self.ticks.saturating_mul(self.repeat as u64)
    }
}

impl fmt::Display for LoopFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{{{}..", self.start)?;
        match self.end {
            Some(end) => write!(f, "{}", end)?,
            None => write!(f, "?")?,
        }
        write!(f, "}}x{} +{}", self.repeat, self.ticks)
    }
}

/// Replays channel programs against a tempo and an optional bank size.
#[derive(Debug, Clone)]
pub struct SequenceValidator {
    tempo: u16,
    declared_count: Option<usize>,
    usage: [u32; MAX_SLOTS],
}

impl SequenceValidator {
    /// `declared_count` is the number of instruments of the bank the song
    /// plays with, when it is known.
    pub fn new(tempo: u16, declared_count: Option<usize>) -> Self {
        Self {
            tempo: tempo.max(1),
            declared_count,
            usage: [0; MAX_SLOTS],
        }
    }

    /// Play count of every instrument slot so far.
    pub fn usage(&self) -> &[u32; MAX_SLOTS] {
        &self.usage
    }

    /// Replay `channel`, filling in its duration and loop depth.
    ///
    /// Loops left open at the end of the program lose their LoopStart event;
    /// the removal is recorded as a fix.
    pub fn replay(&mut self, channel: &mut Channel, report: &mut Report) -> QuartetResult<()> {
        let tag = channel.tag();
        let mut stack: Vec<LoopFrame> = Vec::new();
        let mut ticks: u64 = 0;
        let mut depth = 0;
        let mut voice: Option<usize> = None;

        for event in &channel.events {
            match event.command {
                Command::Play | Command::Rest | Command::Slide => {
                    if event.length % self.tempo != 0 {
                        return Err(QuartetError::TempoMismatch {
                            tempo: self.tempo,
                            channel: tag,
                            event: event.to_string(),
                        });
                    }
                    let scope = match stack.last_mut() {
                        Some(frame) => &mut frame.ticks,
                        None => &mut ticks,
                    };
                    *scope = scope.saturating_add(event.length as u64);

                    if event.command == Command::Play {
                        self.play(voice, tag, event)?;
                    }
                }
                Command::Voice => {
                    let slot = event.voice();
                    if let Some(count) = self.declared_count {
                        if slot >= count {
                            report.warn(format!(
                                "\"V\"oice out of range ({}>={}) -- {}{}",
                                slot, count, tag, event
                            ));
                        }
                    }
                    voice = Some(slot);
                }
                Command::LoopStart => stack.push(LoopFrame::open(event.index)),
                Command::LoopEnd => {
                    let mut frame = match stack.pop() {
                        Some(frame) => frame,
                        None => {
                            // No explicit start: the loop covers everything so far.
                            tracing::debug!(channel = %tag, "{} implicit loop start", event);
                            let frame = LoopFrame {
                                ticks,
                                ..LoopFrame::open(0)
                            };
                            ticks = 0;
                            frame
                        }
                    };
                    frame.end = Some(event.index);
                    frame.repeat = event.repeat_count();

                    if frame.ticks == 0 {
                        return Err(QuartetError::InfiniteLoop {
                            channel: tag,
                            frame: frame.to_string(),
                        });
                    }
                    if frame.repeat == 1 {
                        tracing::debug!(channel = %tag, "useless loop {}", frame);
                    }

                    let scope = match stack.last_mut() {
                        Some(outer) => &mut outer.ticks,
                        None => &mut ticks,
                    };
                    *scope = scope.saturating_add(frame.total());
                    tracing::trace!(
                        "{}{} += {}x{} +{}",
                        tag,
                        ".".repeat(stack.len()),
                        frame.repeat,
                        frame.ticks,
                        frame.total()
                    );
                }
                Command::End => {}
            }
            depth = depth.max(stack.len());
        }

        if !stack.is_empty() {
            for frame in stack.iter().rev() {
                ticks = ticks.saturating_add(frame.ticks);
                let position = channel
                    .events
                    .iter()
                    .position(|ev| ev.index == frame.start && ev.command == Command::LoopStart);
                if let Some(position) = position {
                    let removed = channel.events.remove(position);
                    report.fix(format!(
                        "deleted dangling loop point\n>> {}{}\n>> {}",
                        tag, removed, frame
                    ));
                }
            }
            channel.reindex();
        }

        channel.ticks = ticks;
        channel.max_loop_depth = depth;
        tracing::debug!("{}", channel);
        Ok(())
    }

    fn play(&mut self, voice: Option<usize>, tag: char, event: &SequenceEvent) -> QuartetResult<()> {
        let slot = voice.ok_or_else(|| QuartetError::NoVoice {
            channel: tag,
            event: event.to_string(),
        })?;
        if let Some(count) = self.declared_count {
            if slot >= count {
                return Err(QuartetError::VoiceOutOfRange {
                    channel: tag,
                    voice: slot,
                    count,
                    event: event.to_string(),
                });
            }
        }
        if let Some(plays) = self.usage.get_mut(slot) {
            *plays += 1;
        }
        Ok(())
    }

    /// Song duration over replayed channels; warns about channels that
    /// drift out of phase with the longest one.
    pub fn finish(&self, channels: &[Channel], report: &mut Report) -> u64 {
        let song = channels.iter().map(|c| c.ticks).max().unwrap_or(0);
        for chan in channels {
            if chan.ticks != 0 && song % chan.ticks != 0 {
                report.warn(format!(
                    "song duration {} not a multiple of channel duration\n>> {}",
                    song, chan
                ));
            }
        }
        song
    }
}
