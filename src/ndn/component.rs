//! Typed name components and their URI representation.

use std::{fmt, str::FromStr};

use bytes::{Bytes, BytesMut};

use super::PacketError;
use crate::tlv::{Block, put_nni, read_nni, types};

/// One component of an NDN [`Name`](super::Name).
///
/// Components are compared by type first and then by value, which gives the
/// canonical NDN ordering for equal-length values.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Component {
    typ: u32,
    value: Bytes,
}

impl Component {
    /// Construct a component of an arbitrary type.
    #[must_use]
    pub fn new(typ: u32, value: impl Into<Bytes>) -> Self {
        Self {
            typ,
            value: value.into(),
        }
    }

    /// Construct a generic component.
    #[must_use]
    pub fn generic(value: impl Into<Bytes>) -> Self {
        Self::new(types::GENERIC_NAME_COMPONENT, value)
    }

    /// Construct a typed component carrying a NonNegativeInteger.
    #[must_use]
    pub fn from_number(typ: u32, number: u64) -> Self {
        let mut buf = BytesMut::new();
        put_nni(&mut buf, number);
        Self::new(typ, buf.freeze())
    }

    /// Construct a version component (`v=`).
    #[must_use]
    pub fn version(version: u64) -> Self {
        Self::from_number(types::VERSION_NAME_COMPONENT, version)
    }

    /// Construct a segment component (`seg=`).
    #[must_use]
    pub fn segment(segment: u64) -> Self {
        Self::from_number(types::SEGMENT_NAME_COMPONENT, segment)
    }

    /// Construct a sequence-number component (`seq=`).
    #[must_use]
    pub fn sequence_num(sequence: u64) -> Self {
        Self::from_number(types::SEQUENCE_NUM_NAME_COMPONENT, sequence)
    }

    /// TLV-TYPE of the component.
    #[must_use]
    pub fn typ(&self) -> u32 { self.typ }

    /// Raw component value.
    #[must_use]
    pub fn value(&self) -> &Bytes { &self.value }

    /// Whether this is a generic component.
    #[must_use]
    pub fn is_generic(&self) -> bool { self.typ == types::GENERIC_NAME_COMPONENT }

    /// Interpret the value as a NonNegativeInteger.
    ///
    /// # Errors
    ///
    /// Returns an error when the value length is not 1, 2, 4 or 8.
    pub fn to_number(&self) -> Result<u64, PacketError> { Ok(read_nni(&self.value)?) }

    /// Decode the value as a version number, if this is a version component.
    #[must_use]
    pub fn as_version(&self) -> Option<u64> {
        (self.typ == types::VERSION_NAME_COMPONENT)
            .then(|| read_nni(&self.value).ok())
            .flatten()
    }

    /// Decode the value as a sequence number, if this is a sequence component.
    #[must_use]
    pub fn as_sequence_num(&self) -> Option<u64> {
        (self.typ == types::SEQUENCE_NUM_NAME_COMPONENT)
            .then(|| read_nni(&self.value).ok())
            .flatten()
    }

    /// Decode the value as a segment number, if this is a segment component.
    #[must_use]
    pub fn as_segment(&self) -> Option<u64> {
        (self.typ == types::SEGMENT_NAME_COMPONENT)
            .then(|| read_nni(&self.value).ok())
            .flatten()
    }

    pub(crate) fn from_block(block: &Block) -> Self {
        Self::new(block.typ(), block.value().clone())
    }

    pub(crate) fn to_block(&self) -> Block { Block::new(self.typ, self.value.clone()) }

    fn numeric_label(&self) -> Option<&'static str> {
        match self.typ {
            types::SEGMENT_NAME_COMPONENT => Some("seg"),
            types::BYTE_OFFSET_NAME_COMPONENT => Some("off"),
            types::VERSION_NAME_COMPONENT => Some("v"),
            types::TIMESTAMP_NAME_COMPONENT => Some("t"),
            types::SEQUENCE_NUM_NAME_COMPONENT => Some("seq"),
            _ => None,
        }
    }
}

fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~')
}

fn write_escaped(f: &mut fmt::Formatter<'_>, value: &[u8]) -> fmt::Result {
    if value.iter().all(|&b| b == b'.') {
        // "." and ".." are path segments in URIs, so periods-only values gain three more.
        for _ in 0..value.len() + 3 {
            f.write_str(".")?;
        }
        return Ok(());
    }
    for &byte in value {
        if is_unreserved(byte) {
            write!(f, "{}", char::from(byte))?;
        } else {
            write!(f, "%{byte:02X}")?;
        }
    }
    Ok(())
}

fn write_hex(f: &mut fmt::Formatter<'_>, value: &[u8]) -> fmt::Result {
    for byte in value {
        write!(f, "{byte:02x}")?;
    }
    Ok(())
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = self.numeric_label()
            && let Ok(number) = read_nni(&self.value)
        {
            return write!(f, "{label}={number}");
        }
        match self.typ {
            types::GENERIC_NAME_COMPONENT => write_escaped(f, &self.value),
            types::IMPLICIT_SHA256_DIGEST_COMPONENT => {
                f.write_str("sha256digest=")?;
                write_hex(f, &self.value)
            }
            types::PARAMETERS_SHA256_DIGEST_COMPONENT => {
                f.write_str("params-sha256=")?;
                write_hex(f, &self.value)
            }
            other => {
                write!(f, "{other}=")?;
                write_escaped(f, &self.value)
            }
        }
    }
}

fn unescape(text: &str) -> Result<Vec<u8>, PacketError> {
    let bytes = text.as_bytes();
    if bytes.len() >= 3 && bytes.iter().all(|&b| b == b'.') {
        return Ok(bytes[3..].to_vec());
    }
    let mut out = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().copied();
    while let Some(byte) = iter.next() {
        if byte != b'%' {
            out.push(byte);
            continue;
        }
        let (Some(hi), Some(lo)) = (iter.next(), iter.next()) else {
            return Err(PacketError::InvalidUri(text.to_owned()));
        };
        let pair = [hi, lo];
        let hex = std::str::from_utf8(&pair).map_err(|_| PacketError::InvalidUri(text.to_owned()))?;
        let decoded =
            u8::from_str_radix(hex, 16).map_err(|_| PacketError::InvalidUri(text.to_owned()))?;
        out.push(decoded);
    }
    Ok(out)
}

fn parse_hex(text: &str) -> Result<Vec<u8>, PacketError> {
    if text.len() % 2 != 0 {
        return Err(PacketError::InvalidUri(text.to_owned()));
    }
    (0..text.len())
        .step_by(2)
        .map(|i| {
            text.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| PacketError::InvalidUri(text.to_owned()))
        })
        .collect()
}

impl FromStr for Component {
    type Err = PacketError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let Some((label, rest)) = text.split_once('=') else {
            return Ok(Self::generic(unescape(text)?));
        };
        let numeric = |typ: u32| -> Result<Self, PacketError> {
            let number = rest
                .parse::<u64>()
                .map_err(|_| PacketError::InvalidUri(text.to_owned()))?;
            Ok(Self::from_number(typ, number))
        };
        match label {
            "seg" => numeric(types::SEGMENT_NAME_COMPONENT),
            "off" => numeric(types::BYTE_OFFSET_NAME_COMPONENT),
            "v" => numeric(types::VERSION_NAME_COMPONENT),
            "t" => numeric(types::TIMESTAMP_NAME_COMPONENT),
            "seq" => numeric(types::SEQUENCE_NUM_NAME_COMPONENT),
            "sha256digest" => Ok(Self::new(
                types::IMPLICIT_SHA256_DIGEST_COMPONENT,
                parse_hex(rest)?,
            )),
            "params-sha256" => Ok(Self::new(
                types::PARAMETERS_SHA256_DIGEST_COMPONENT,
                parse_hex(rest)?,
            )),
            other => match other.parse::<u32>() {
                Ok(0) => Err(PacketError::InvalidUri(text.to_owned())),
                Ok(typ) => Ok(Self::new(typ, unescape(rest)?)),
                // '=' inside a generic component is legal once escaped, but be lenient.
                Err(_) => Ok(Self::generic(unescape(text)?)),
            },
        }
    }
}
