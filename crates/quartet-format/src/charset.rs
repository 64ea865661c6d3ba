//! Atari ST character set.
//!
//! Instrument names and info texts were typed on an Atari ST. Bytes below
//! 0x80 are ASCII; the upper half maps through [`ATARI_TO_UNICODE`].

/// Unicode code points for bytes 0x80..=0xFF.
pub const ATARI_TO_UNICODE: [u16; 128] = [
    0x00c7, 0x00fc, 0x00e9, 0x00e2, 0x00e4, 0x00e0, 0x00e5, 0x00e7, // 0x80
    0x00ea, 0x00eb, 0x00e8, 0x00ef, 0x00ee, 0x00ec, 0x00c4, 0x00c5, // 0x88
    0x00c9, 0x00e6, 0x00c6, 0x00f4, 0x00f6, 0x00f2, 0x00fb, 0x00f9, // 0x90
    0x00ff, 0x00d6, 0x00dc, 0x00a2, 0x00a3, 0x00a5, 0x00df, 0x0192, // 0x98
    0x00e1, 0x00ed, 0x00f3, 0x00fa, 0x00f1, 0x00d1, 0x00aa, 0x00ba, // 0xA0
    0x00bf, 0x2310, 0x00ac, 0x00bd, 0x00bc, 0x00a1, 0x00ab, 0x00bb, // 0xA8
    0x00e3, 0x00f5, 0x00d8, 0x00f8, 0x0153, 0x0152, 0x00c0, 0x00c3, // 0xB0
    0x00d5, 0x00a8, 0x00b4, 0x2020, 0x00b6, 0x00a9, 0x00ae, 0x2122, // 0xB8
    0x0133, 0x0132, 0x05d0, 0x05d1, 0x05d2, 0x05d3, 0x05d4, 0x05d5, // 0xC0
    0x05d6, 0x05d7, 0x05d8, 0x05d9, 0x05db, 0x05dc, 0x05de, 0x05e0, // 0xC8
    0x05e1, 0x05e2, 0x05e4, 0x05e6, 0x05e7, 0x05e8, 0x05e9, 0x05ea, // 0xD0
    0x05df, 0x05da, 0x05dd, 0x05e3, 0x05e5, 0x00a7, 0x2227, 0x221e, // 0xD8
    0x03b1, 0x03b2, 0x0393, 0x03c0, 0x03a3, 0x03c3, 0x00b5, 0x03c4, // 0xE0
    0x03a6, 0x0398, 0x03a9, 0x03b4, 0x222e, 0x03c6, 0x2208, 0x2229, // 0xE8
    0x2261, 0x00b1, 0x2265, 0x2264, 0x2320, 0x2321, 0x00f7, 0x2248, // 0xF0
    0x00b0, 0x2219, 0x00b7, 0x221a, 0x207f, 0x00b2, 0x00b3, 0x00af, // 0xF8
];

/// Map one Atari ST byte to a character.
pub fn atari_char(byte: u8) -> char {
    if byte < 0x80 {
        byte as char
    } else {
        // Every table entry is a valid BMP scalar value.
        char::from_u32(ATARI_TO_UNICODE[(byte - 0x80) as usize] as u32)
            .unwrap_or(char::REPLACEMENT_CHARACTER)
    }
}

/// Decode an Atari ST string.
pub fn decode_atari(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| atari_char(b)).collect()
}

/// Decode a fixed-width name field: stops at the first NUL and trims
/// trailing blanks.
pub fn decode_name(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    decode_atari(&bytes[..end]).trim_end().to_string()
}
