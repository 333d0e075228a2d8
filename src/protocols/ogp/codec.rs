//! Atomic OGP wire types.
//!
//! Decoders are `nom` parsers over a complete buffer: each returns the unconsumed rest and fails
//! instead of reading past the end. Encoders append to any `BufMut`.

use crate::models::{ColorEntry, ColorRun};
use bytes::BufMut;
use nom::{
    bytes::complete::{tag, take_until},
    combinator::{cond, map},
    number::complete::{le_i16, le_i32, le_i8, le_u16, le_u32, le_u8},
    sequence::terminated,
    IResult,
};
use std::ops::{Range, RangeInclusive};

pub const FLAGS_PER_GROUP: u8 = 7;
const CONTINUATION: u8 = 0x80;
const GROUP_MASK: u8 = 0x7F;

const NUL: &[u8] = b"\0";

/// Color values that are followed by a 16-bit extended color.
pub const EXTENDED_COLOR_RANGE: RangeInclusive<u8> = 0x90..=0x9F;

/// Address of a single flag: (group, bit).
pub type Flag = (usize, u8);

/// A chain of 7-bit flag groups. There is always at least one group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlagGroups {
    groups: Vec<u8>,
}

impl Default for FlagGroups {
    fn default() -> Self {
        Self { groups: vec![0] }
    }
}

impl FlagGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from raw group values. Bit 7 of each value is ignored.
    pub fn from_groups<I>(groups: I) -> Self
    where
        I: IntoIterator<Item = u8>,
    {
        let groups = groups
            .into_iter()
            .map(|g| g & GROUP_MASK)
            .collect::<Vec<_>>();
        if groups.is_empty() {
            Self::default()
        } else {
            Self { groups }
        }
    }

    /// Builds a set with every listed flag raised.
    pub fn with_flags(flags: &[Flag]) -> Self {
        let mut out = Self::new();
        for &flag in flags {
            out.set(flag);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn group(&self, index: usize) -> Option<u8> {
        self.groups.get(index).copied()
    }

    /// Flags of groups that were not transmitted read as unset.
    pub fn has(&self, (group, bit): Flag) -> bool {
        bit < FLAGS_PER_GROUP
            && self
                .group(group)
                .map_or(false, |g| g & (1 << bit) != 0)
    }

    pub fn set(&mut self, (group, bit): Flag) {
        debug_assert!(bit < FLAGS_PER_GROUP);
        if self.groups.len() <= group {
            self.groups.resize(group + 1, 0);
        }
        self.groups[group] |= (1 << bit) & GROUP_MASK;
    }

    /// Reads `bits` of `group` as an unsigned number, lowest bit first.
    pub fn bits(&self, group: usize, bits: Range<u8>) -> u8 {
        let width = bits.end.saturating_sub(bits.start);
        let mask = ((1u16 << width) - 1) as u8;
        self.group(group).map_or(0, |g| (g >> bits.start) & mask)
    }
}

pub fn flag_groups(mut input: &[u8]) -> IResult<&[u8], FlagGroups> {
    let mut groups = Vec::new();
    loop {
        let (rest, byte) = le_u8(input)?;
        input = rest;
        groups.push(byte & GROUP_MASK);
        if byte & CONTINUATION == 0 {
            break;
        }
    }

    Ok((input, FlagGroups { groups }))
}

pub fn put_flag_groups<B: BufMut>(buf: &mut B, flags: &FlagGroups) {
    let last = flags.groups.len() - 1;
    for (i, group) in flags.groups.iter().enumerate() {
        if i < last {
            buf.put_u8(group | CONTINUATION);
        } else {
            buf.put_u8(*group);
        }
    }
}

pub fn var_uint(input: &[u8]) -> IResult<&[u8], u32> {
    let (input, b) = le_u8(input)?;
    match b {
        0xFE => map(le_u16, u32::from)(input),
        0xFF => le_u32(input),
        b => Ok((input, u32::from(b))),
    }
}

pub fn put_var_uint<B: BufMut>(buf: &mut B, v: u32) {
    if v <= 0xFD {
        buf.put_u8(v as u8);
    } else if v <= 0xFFFF {
        buf.put_u8(0xFE);
        buf.put_u16_le(v as u16);
    } else {
        buf.put_u8(0xFF);
        buf.put_u32_le(v);
    }
}

/// -127 and -128 are width markers, so those two values never use the one-byte form.
pub fn var_sint(input: &[u8]) -> IResult<&[u8], i32> {
    let (input, s) = le_i8(input)?;
    match s {
        -0x80 => map(le_i16, i32::from)(input),
        -0x7F => le_i32(input),
        s => Ok((input, i32::from(s))),
    }
}

pub fn put_var_sint<B: BufMut>(buf: &mut B, v: i32) {
    if (-0x7E..=0x7F).contains(&v) {
        buf.put_i8(v as i8);
    } else if i32::from(i16::MIN) <= v && v <= i32::from(i16::MAX) {
        buf.put_i8(-0x80);
        buf.put_i16_le(v as i16);
    } else {
        buf.put_i8(-0x7F);
        buf.put_i32_le(v);
    }
}

pub fn cstring(input: &[u8]) -> IResult<&[u8], String> {
    map(terminated(take_until(NUL), tag(NUL)), |raw: &[u8]| {
        String::from_utf8_lossy(raw).into_owned()
    })(input)
}

pub fn put_cstring<B: BufMut>(buf: &mut B, s: &str) {
    buf.put_slice(s.as_bytes());
    buf.put_u8(0);
}

fn color_entry(input: &[u8]) -> IResult<&[u8], ColorEntry> {
    let (input, delta_position) = var_uint(input)?;
    let (input, color_value) = le_u8(input)?;
    let (input, extended) = cond(EXTENDED_COLOR_RANGE.contains(&color_value), le_u16)(input)?;

    Ok((
        input,
        ColorEntry {
            delta_position,
            color_value,
            extended,
        },
    ))
}

/// Reads a size-prefixed run of color entries. Entries are read until their encoded
/// length reaches the declared size; the last entry may overshoot it.
pub fn color_run(input: &[u8]) -> IResult<&[u8], ColorRun> {
    let (mut input, total_size) = var_uint(input)?;
    let total_size = total_size as usize;

    let mut entries = Vec::new();
    let mut consumed = 0;
    while consumed < total_size {
        let (rest, entry) = color_entry(input)?;
        consumed += input.len() - rest.len();
        input = rest;
        entries.push(entry);
    }

    Ok((input, entries))
}

pub fn put_color_run<B: BufMut>(buf: &mut B, entries: &[ColorEntry]) {
    let mut encoded = Vec::new();
    for entry in entries {
        put_var_uint(&mut encoded, entry.delta_position);
        encoded.put_u8(entry.color_value);
        if let Some(extended) = entry.extended {
            encoded.put_u16_le(extended);
        }
    }
    put_var_uint(buf, encoded.len() as u32);
    buf.put_slice(&encoded);
}

/// 16 raw bytes, as used for map checksums.
pub fn md5(input: &[u8]) -> IResult<&[u8], [u8; 16]> {
    map(nom::bytes::complete::take(16usize), |raw: &[u8]| {
        let mut out = [0; 16];
        out.copy_from_slice(raw);
        out
    })(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_uint(v: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        put_var_uint(&mut buf, v);
        buf
    }

    fn encode_sint(v: i32) -> Vec<u8> {
        let mut buf = Vec::new();
        put_var_sint(&mut buf, v);
        buf
    }

    #[test]
    fn var_uint_widths() {
        for &(v, width) in &[
            (0, 1),
            (0x7F, 1),
            (0xFD, 1),
            (0xFE, 3),
            (0xFF, 3),
            (0xFFFF, 3),
            (0x1_0000, 5),
            (u32::MAX, 5),
        ] {
            let encoded = encode_uint(v);
            assert_eq!(encoded.len(), width, "width of {:#X}", v);
            assert_eq!(var_uint(&encoded), Ok((&[][..], v)));
        }
    }

    #[test]
    fn var_uint_wide_forms() {
        assert_eq!(var_uint(&[0xFE, 0x34, 0x12, 0xAA]), Ok((&[0xAA][..], 0x1234)));
        assert_eq!(
            var_uint(&[0xFF, 0x78, 0x56, 0x34, 0x12]),
            Ok((&[][..], 0x1234_5678))
        );
        assert!(var_uint(&[0xFE, 0x34]).is_err());
        assert!(var_uint(&[]).is_err());
    }

    #[test]
    fn var_uint_roundtrip_sweep() {
        let mut v: u64 = 0;
        while v <= u64::from(u32::MAX) {
            let encoded = encode_uint(v as u32);
            assert_eq!(var_uint(&encoded).unwrap().1, v as u32);
            v = v * 3 + 1;
        }
    }

    #[test]
    fn var_sint_roundtrip_sweep() {
        for v in i32::from(i16::MIN)..=i32::from(i16::MAX) {
            let encoded = encode_sint(v);
            let width = if (-0x7E..=0x7F).contains(&v) { 1 } else { 3 };
            assert_eq!(encoded.len(), width, "width of {}", v);
            assert_eq!(var_sint(&encoded).unwrap(), (&[][..], v));
        }

        let mut v: i64 = 1;
        while v <= i64::from(i32::MAX) + 1 {
            for &w in &[v - 1, -v] {
                let w = w as i32;
                let encoded = encode_sint(w);
                assert_eq!(var_sint(&encoded).unwrap().1, w);
            }
            v = v * 3 + 1;
        }
        assert_eq!(var_sint(&encode_sint(i32::MIN)).unwrap().1, i32::MIN);
    }

    #[test]
    fn var_sint_widths() {
        for &(v, width) in &[
            (0, 1),
            (0x7F, 1),
            (-0x7E, 1),
            (-0x7F, 3),
            (-0x80, 3),
            (0x80, 3),
            (i32::from(i16::MIN), 3),
            (i32::from(i16::MAX), 3),
            (i32::from(i16::MIN) - 1, 5),
            (i32::MAX, 5),
            (i32::MIN, 5),
        ] {
            let encoded = encode_sint(v);
            assert_eq!(encoded.len(), width, "width of {}", v);
            assert_eq!(var_sint(&encoded), Ok((&[][..], v)));
        }
    }

    #[test]
    fn var_sint_sentinels() {
        assert_eq!(var_sint(&[0x80, 0x81, 0xFF]), Ok((&[][..], -0x7F)));
        assert_eq!(var_sint(&[0x81, 0xFE, 0xFF, 0xFF, 0xFF]), Ok((&[][..], -2)));
        assert_eq!(var_sint(&[0x82]), Ok((&[][..], -0x7E)));
        assert!(var_sint(&[0x81, 0x00]).is_err());
    }

    #[test]
    fn flag_groups_roundtrip() {
        for groups in &[
            vec![0x00],
            vec![0x7F],
            vec![0x3F, 0x01],
            vec![0x0F, 0x1F, 0x0F],
            vec![0x3F, 0x3F, 0x3F, 0x01],
            vec![0x00, 0x00, 0x40],
        ] {
            let flags = FlagGroups::from_groups(groups.iter().copied());
            let mut buf = Vec::new();
            put_flag_groups(&mut buf, &flags);

            assert_eq!(buf.len(), groups.len());
            assert_eq!(flag_groups(&buf), Ok((&[][..], flags)));
        }
    }

    #[test]
    fn flag_groups_continuation() {
        let (rest, flags) = flag_groups(&[0x81, 0x02, 0xFF]).unwrap();

        assert_eq!(rest, &[0xFF]);
        assert_eq!(flags.len(), 2);
        assert!(flags.has((0, 0)));
        assert!(flags.has((1, 1)));
        assert!(!flags.has((1, 0)));
        // groups that were never transmitted read as unset
        assert!(!flags.has((2, 0)));
        assert!(!flags.has((0, 7)));
    }

    #[test]
    fn flag_groups_unterminated() {
        assert!(flag_groups(&[0x81, 0x80]).is_err());
        assert!(flag_groups(&[]).is_err());
    }

    #[test]
    fn flag_bits() {
        let flags = FlagGroups::from_groups(vec![0b0101_1010]);

        assert_eq!(flags.bits(0, 0..2), 0b10);
        assert_eq!(flags.bits(0, 1..5), 0b1101);
        assert_eq!(flags.bits(0, 4..7), 0b101);
        assert_eq!(flags.bits(3, 0..7), 0);
    }

    #[test]
    fn with_flags_grows_groups() {
        let flags = FlagGroups::with_flags(&[(0, 1), (3, 0)]);
        let mut buf = Vec::new();
        put_flag_groups(&mut buf, &flags);

        assert_eq!(buf, vec![0x82, 0x80, 0x80, 0x01]);
    }

    #[test]
    fn cstring_reads_to_terminator() {
        assert_eq!(
            cstring(b"de_dust\0mode"),
            Ok((&b"mode"[..], "de_dust".to_string()))
        );
        assert_eq!(cstring(b"\0"), Ok((&[][..], String::new())));
        assert!(cstring(b"no terminator").is_err());
        assert!(cstring(b"").is_err());
    }

    #[test]
    fn color_run_plain_and_extended() {
        let entries = vec![
            ColorEntry {
                delta_position: 0,
                color_value: 0x01,
                extended: None,
            },
            ColorEntry {
                delta_position: 5,
                color_value: 0x90,
                extended: Some(0xF800),
            },
            ColorEntry {
                delta_position: 300,
                color_value: 0x02,
                extended: None,
            },
        ];
        let mut buf = Vec::new();
        put_color_run(&mut buf, &entries);
        buf.push(0xAA);

        assert_eq!(buf[0], 2 + 4 + 4);
        assert_eq!(color_run(&buf), Ok((&[0xAA][..], entries)));
    }

    #[test]
    fn color_run_empty_and_truncated() {
        assert_eq!(color_run(&[0x00, 0x01]), Ok((&[0x01][..], vec![])));
        assert!(color_run(&[0x04, 0x00, 0x95, 0x00]).is_err());
        assert!(color_run(&[0x02, 0x00]).is_err());
    }

    #[test]
    fn md5_needs_sixteen_bytes() {
        let raw = (0..20).collect::<Vec<u8>>();
        let (rest, sum) = md5(&raw).unwrap();

        assert_eq!(rest, &[16, 17, 18, 19]);
        assert_eq!(sum[15], 15);
        assert!(md5(&raw[..15]).is_err());
    }
}
