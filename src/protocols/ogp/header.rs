use super::codec::{flag_groups, put_flag_groups, Flag, FlagGroups};
use crate::errors::{Error, Result};
use bytes::{BufMut, BytesMut};
use enum_primitive_derive::Primitive;
use nom::{
    combinator::{cond, map},
    number::complete::{le_u32, le_u8},
    sequence::pair,
    IResult,
};

pub const SIGNATURE: &[u8] = b"\xFF\xFF\xFF\xFFOGP\0";
pub const SIGNATURE_LEN: usize = 8;

// Header flags, all in group 0
pub const ANSWER: Flag = (0, 0);
pub const CHALLENGE_NUMBER: Flag = (0, 1);
pub const REQUEST_ID: Flag = (0, 2);
pub const SPLIT: Flag = (0, 3);

// header size byte + type byte + one flag group
const MIN_HEADER_SIZE: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Primitive)]
pub enum PacketType {
    Query = 0x01,
    ErrorReply = 0xFF,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Split {
    pub count: u8,
    pub number: u8,
}

/// Everything between the signature and the body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub packet_type: u8,
    pub flags: FlagGroups,
    pub challenge_number: Option<u32>,
    pub request_id: Option<u32>,
    pub split: Option<Split>,
}

impl Header {
    pub fn new(packet_type: PacketType) -> Self {
        Self {
            packet_type: packet_type as u8,
            flags: FlagGroups::new(),
            challenge_number: None,
            request_id: None,
            split: None,
        }
    }

    pub fn is_answer(&self) -> bool {
        self.flags.has(ANSWER)
    }

    /// Writes signature and header. Presence flags are derived from the optional fields.
    pub fn put<B: BufMut>(&self, buf: &mut B) {
        let mut flags = self.flags.clone();
        if self.challenge_number.is_some() {
            flags.set(CHALLENGE_NUMBER);
        }
        if self.request_id.is_some() {
            flags.set(REQUEST_ID);
        }
        if self.split.is_some() {
            flags.set(SPLIT);
        }

        let mut fields = BytesMut::new();
        fields.put_u8(self.packet_type);
        put_flag_groups(&mut fields, &flags);
        if let Some(challenge_number) = self.challenge_number {
            fields.put_u32_le(challenge_number);
        }
        if let Some(request_id) = self.request_id {
            fields.put_u32_le(request_id);
        }
        if let Some(split) = self.split {
            fields.put_u8(split.count);
            fields.put_u8(split.number);
        }

        buf.put_slice(SIGNATURE);
        buf.put_u8((fields.len() + 1) as u8);
        buf.put_slice(&fields);
    }
}

fn header(input: &[u8]) -> IResult<&[u8], Header> {
    let (input, _size) = le_u8(input)?;
    let (input, packet_type) = le_u8(input)?;
    let (input, flags) = flag_groups(input)?;
    let (input, challenge_number) = cond(flags.has(CHALLENGE_NUMBER), le_u32)(input)?;
    let (input, request_id) = cond(flags.has(REQUEST_ID), le_u32)(input)?;
    let (input, split) = cond(
        flags.has(SPLIT),
        map(pair(le_u8, le_u8), |(count, number)| Split { count, number }),
    )(input)?;

    Ok((
        input,
        Header {
            packet_type,
            flags,
            challenge_number,
            request_id,
            split,
        },
    ))
}

/// Strips the signature and returns the header size it announces, checked against the data.
fn header_size(data: &[u8]) -> Result<usize> {
    if data.len() < SIGNATURE_LEN || &data[..SIGNATURE_LEN] != SIGNATURE {
        return Err(Error::InvalidSignature);
    }

    let size = usize::from(*data.get(SIGNATURE_LEN).ok_or(Error::UnexpectedEndOfData)?);
    if size < MIN_HEADER_SIZE || data.len() < SIGNATURE_LEN + size {
        return Err(Error::UnexpectedEndOfData);
    }

    Ok(size)
}

/// Splits an OGP packet into its decoded header and its body.
pub fn parse_packet(data: &[u8]) -> Result<(Header, &[u8])> {
    let size = header_size(data)?;
    let (raw_header, body) = data[SIGNATURE_LEN..].split_at(size);
    let (_, header) = header(raw_header)?;

    Ok((header, body))
}

/// Per-datagram framing, as much as the transport needs before reassembly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Framing {
    /// Signature plus header.
    pub header_len: usize,
    pub split: Option<Split>,
}

impl Framing {
    /// Split count and number are the last two bytes of the header.
    pub fn peek(datagram: &[u8]) -> Result<Self> {
        let size = header_size(datagram)?;
        let raw_header = &datagram[SIGNATURE_LEN..SIGNATURE_LEN + size];
        let (_, flags) = flag_groups(&raw_header[2..])?;

        let split = if flags.has(SPLIT) {
            if size < MIN_HEADER_SIZE + 2 {
                return Err(Error::UnexpectedEndOfData);
            }
            Some(Split {
                count: raw_header[size - 2],
                number: raw_header[size - 1],
            })
        } else {
            None
        };

        Ok(Self {
            header_len: SIGNATURE_LEN + size,
            split,
        })
    }
}
