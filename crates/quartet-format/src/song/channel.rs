use std::fmt;

use serde::Serialize;

use super::event::{Command, SequenceEvent};

/// One of the four channel programs of a song.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Channel {
    /// Channel number, 0..4.
    pub index: usize,
    /// Offset of the first record in the song buffer, if any was read.
    pub offset: Option<usize>,
    /// Decoded records in file order, End included.
    pub events: Vec<SequenceEvent>,
    /// Duration in ticks, loops unrolled.
    pub ticks: u64,
    /// Deepest loop nesting seen during replay.
    pub max_loop_depth: usize,
}

impl Channel {
    /// Empty channel number `index`.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// Channel letter, `A` to `D`.
    pub fn tag(&self) -> char {
        (b'A' + self.index as u8) as char
    }

    /// Whether the program is terminated by an End command.
    pub fn is_closed(&self) -> bool {
        self.events
            .last()
            .is_some_and(|ev| ev.command == Command::End)
    }

    /// Append a zeroed End command.
    pub fn close(&mut self) {
        let index = self.events.len();
        self.events.push(SequenceEvent::new(index, Command::End));
    }

    /// Renumber events after a removal.
    pub fn reindex(&mut self) {
        for (i, ev) in self.events.iter_mut().enumerate() {
            ev.index = i;
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]/{}/{}",
            self.tag(),
            self.events.len(),
            self.ticks,
            self.max_loop_depth
        )
    }
}
