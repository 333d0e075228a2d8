//! Conversion between web colors (`RRGGBB`) and the 16-bit 5-6-5 colors used in OGP color runs.

use crate::errors::{Error, Result};

fn quantize(c: u8, max: u32) -> u16 {
    ((u32::from(c) * max + 127) / 255) as u16
}

fn expand(v: u16, max: u32) -> u8 {
    ((u32::from(v) * 255 + max / 2) / max) as u8
}

/// Parses `RRGGBB`, with or without a leading `#`, into a 5-6-5 color.
pub fn to_16bit(color: &str) -> Result<u16> {
    let digits = color.strip_prefix('#').unwrap_or(color);
    if digits.len() != 6 {
        return Err(Error::InvalidColor(color.into()));
    }
    let rgb = hex::decode(digits).map_err(|_| Error::InvalidColor(color.into()))?;

    let r = quantize(rgb[0], 31);
    let g = quantize(rgb[1], 63);
    let b = quantize(rgb[2], 31);

    Ok(r << 11 | g << 5 | b)
}

/// Formats a 5-6-5 color as uppercase `RRGGBB`.
pub fn to_web(color: u16) -> String {
    let r = expand(color >> 11, 31);
    let g = expand((color >> 5) & 0x3F, 63);
    let b = expand(color & 0x1F, 31);

    hex::encode_upper([r, g, b])
}
