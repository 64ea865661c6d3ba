//! Container demultiplexing.
//!
//! Two bundle formats wrap a bank with its songs:
//!
//! - `.4q`: `"QUARTET\0"`, then `song_size:u32`, `set_size:u32`,
//!   `info_size:u32`, followed by the song, the bank and an info text.
//! - `.quar`: `"QUAR"`, `set_offset:u32`, `song_count:u32` and one `u32`
//!   offset per song. Chunks are measured from their offset to the next one.
//!
//! Slices returned by [`demux`] borrow from the input buffer.

use serde::Serialize;

use crate::codec::{peek_u32, put_u32, FixedRecord, Reader};
use crate::error::{QuartetError, QuartetResult, Structure};
use crate::report::Report;

/// `.4q` signature.
pub const FOURQ_MAGIC: &[u8; 8] = b"QUARTET\0";

/// `.quar` signature.
pub const QUAR_MAGIC: &[u8; 4] = b"QUAR";

/// Container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    /// `.4q`: one song, one bank, one info text.
    FourQ,
    /// `.quar`: one bank, several songs.
    Quar,
}

impl ContainerKind {
    /// Usual file extension.
    pub fn extension(self) -> &'static str {
        match self {
            ContainerKind::FourQ => "4q",
            ContainerKind::Quar => "quar",
        }
    }
}

/// Contents of a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle<'a> {
    pub kind: ContainerKind,
    /// Instrument bank.
    pub instrument_set: &'a [u8],
    /// Songs in container order.
    pub songs: Vec<&'a [u8]>,
    /// Info text (Atari charset), `.4q` only.
    pub info: Option<&'a [u8]>,
}

/// `.4q` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FourQHeader {
    pub song_size: u32,
    pub set_size: u32,
    pub info_size: u32,
}

impl FixedRecord for FourQHeader {
    const SIZE: usize = 20;
    const STRUCTURE: Structure = Structure::Container;

    fn decode(data: &[u8]) -> QuartetResult<Self> {
        let mut r = Reader::new(data, Self::STRUCTURE);
        if r.array::<8>()? != *FOURQ_MAGIC {
            return Err(QuartetError::format_at(
                Structure::Container,
                "missing QUARTET signature",
                0,
            ));
        }
        Ok(Self {
            song_size: r.u32()?,
            set_size: r.u32()?,
            info_size: r.u32()?,
        })
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(FOURQ_MAGIC);
        put_u32(out, self.song_size);
        put_u32(out, self.set_size);
        put_u32(out, self.info_size);
    }
}

/// Whether `data` starts with the ICE! packer signature, in any case.
pub fn is_ice_packed(data: &[u8]) -> bool {
    data.get(..4).is_some_and(|m| m.eq_ignore_ascii_case(b"ICE!"))
}

/// Split a container. Returns `None` when `data` is not a container.
pub fn demux<'a>(data: &'a [u8], report: &mut Report) -> QuartetResult<Option<Bundle<'a>>> {
    if is_ice_packed(data) {
        return Err(QuartetError::Packed);
    }
    if data.starts_with(FOURQ_MAGIC) {
        demux_4q(data, report).map(Some)
    } else if data.starts_with(QUAR_MAGIC) {
        demux_quar(data).map(Some)
    } else {
        Ok(None)
    }
}

fn demux_4q<'a>(data: &'a [u8], report: &mut Report) -> QuartetResult<Bundle<'a>> {
    let header = FourQHeader::decode_at(data, 0)?;
    tracing::debug!(
        song = header.song_size,
        set = header.set_size,
        info = header.info_size,
        "QUARTET (.4q) detected"
    );

    let mut offset = FourQHeader::SIZE;
    let mut take = |size: u32, what: &str| -> QuartetResult<&'a [u8]> {
        let end = offset
            .checked_add(size as usize)
            .filter(|&end| end <= data.len())
            .ok_or_else(|| {
                QuartetError::format_at(
                    Structure::Container,
                    format!(
                        "{} chunk out of range -- {}+{} > {}",
                        what,
                        offset,
                        size,
                        data.len()
                    ),
                    offset,
                )
            })?;
        let chunk = &data[offset..end];
        offset = end;
        Ok(chunk)
    };

    let song = take(header.song_size, "song")?;
    let instrument_set = take(header.set_size, "set")?;
    let info = take(header.info_size, "info")?;

    let rest = data.len() - FourQHeader::SIZE - song.len() - instrument_set.len() - info.len();
    if rest > 0 {
        report.warn(format!("{} unexpected garbage bytes at end of container", rest));
    }

    Ok(Bundle {
        kind: ContainerKind::FourQ,
        instrument_set,
        songs: vec![song],
        info: (!info.is_empty()).then_some(info),
    })
}

fn demux_quar(data: &[u8]) -> QuartetResult<Bundle<'_>> {
    let field = |at: usize| {
        peek_u32(data, at).ok_or_else(|| {
            QuartetError::format_at(Structure::Container, "truncated QUAR header", at)
        })
    };
    let set_offset = field(4)? as usize;
    let count = field(8)? as usize;
    let table_fits = count
        .checked_mul(4)
        .and_then(|n| n.checked_add(12))
        .is_some_and(|end| end <= data.len());
    if !table_fits {
        return Err(QuartetError::format_at(
            Structure::Container,
            format!("song table out of range -- {} songs", count),
            8,
        ));
    }
    tracing::debug!(set = set_offset, songs = count, "SC68-QUAR (.quar) detected");

    // (chunk id, offset); id 0 is the bank, songs are numbered from 1.
    let mut chunks = vec![(0usize, set_offset)];
    for i in 0..count {
        chunks.push((i + 1, field(12 + 4 * i)? as usize));
    }
    if let Some(&(id, offset)) = chunks.iter().find(|(_, o)| *o > data.len()) {
        return Err(QuartetError::format_at(
            Structure::Container,
            format!("chunk #{} out of range -- {} > {}", id, offset, data.len()),
            if id == 0 { 4 } else { 8 + 4 * id },
        ));
    }

    let mut order = chunks.clone();
    order.sort_by_key(|&(id, offset)| (offset, id));
    let mut slices: Vec<&[u8]> = vec![&[]; chunks.len()];
    for (k, &(id, offset)) in order.iter().enumerate() {
        let end = order.get(k + 1).map_or(data.len(), |&(_, next)| next);
        slices[id] = &data[offset..end];
    }

    Ok(Bundle {
        kind: ContainerKind::Quar,
        instrument_set: slices[0],
        songs: slices[1..].to_vec(),
        info: None,
    })
}

/// Build a `.4q` container.
pub fn mux_4q(song: &[u8], instrument_set: &[u8], info: &[u8]) -> Vec<u8> {
    let header = FourQHeader {
        song_size: song.len() as u32,
        set_size: instrument_set.len() as u32,
        info_size: info.len() as u32,
    };
    let mut out = header.to_vec();
    out.extend_from_slice(song);
    out.extend_from_slice(instrument_set);
    out.extend_from_slice(info);
    out
}
