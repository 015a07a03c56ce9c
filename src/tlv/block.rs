//! Owned TLV elements and a small writer for building nested structures.

use bytes::{BufMut, Bytes, BytesMut};

use super::{
    TlvError,
    varnum::{decode_type_length, nni_len, put_nni, put_var_number, read_nni, var_number_len},
};

/// A decoded TLV element.
///
/// The value is held as [`Bytes`] so nested elements and fragment payloads
/// can be sliced out of the receive buffer without copying.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    typ: u32,
    value: Bytes,
}

impl Block {
    /// Construct an element from its type and raw value.
    #[must_use]
    pub fn new(typ: u32, value: impl Into<Bytes>) -> Self {
        Self {
            typ,
            value: value.into(),
        }
    }

    /// Construct an element whose value is a NonNegativeInteger.
    #[must_use]
    pub fn from_nni(typ: u32, value: u64) -> Self {
        let mut buf = BytesMut::with_capacity(nni_len(value));
        put_nni(&mut buf, value);
        Self::new(typ, buf.freeze())
    }

    /// TLV-TYPE of this element.
    #[must_use]
    pub fn typ(&self) -> u32 { self.typ }

    /// TLV-VALUE of this element.
    #[must_use]
    pub fn value(&self) -> &Bytes { &self.value }

    /// Size of the element once encoded, header included.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        var_number_len(u64::from(self.typ))
            + var_number_len(self.value.len() as u64)
            + self.value.len()
    }

    /// Append the wire encoding of this element to `dst`.
    pub fn encode_into(&self, dst: &mut impl BufMut) {
        put_var_number(dst, u64::from(self.typ));
        put_var_number(dst, self.value.len() as u64);
        dst.put_slice(&self.value);
    }

    /// Wire encoding of this element.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf.freeze()
    }

    /// Decode one element from the front of `src`.
    ///
    /// Returns the element and the number of bytes it occupied; trailing
    /// bytes are left for the caller.
    ///
    /// # Errors
    ///
    /// Returns [`TlvError::Truncated`] if `src` holds less than one complete
    /// element, or any header error from
    /// [`decode_type_length`](super::decode_type_length).
    pub fn decode(src: &Bytes) -> Result<(Self, usize), TlvError> {
        let header = decode_type_length(src)?;
        let total = header.total_len();
        if src.len() < total {
            return Err(TlvError::Truncated {
                needed: total,
                available: src.len(),
            });
        }
        let value = src.slice(header.header_len..total);
        Ok((Self::new(header.typ, value), total))
    }

    /// Decode an element that must have type `expected` and span all of `src`.
    ///
    /// # Errors
    ///
    /// Returns [`TlvError::UnexpectedType`] for a type mismatch,
    /// [`TlvError::TrailingBytes`] when input is left over and any error
    /// from [`Block::decode`].
    pub fn decode_exact(src: &Bytes, expected: u32) -> Result<Self, TlvError> {
        let (block, used) = Self::decode(src)?;
        if block.typ != expected {
            return Err(TlvError::UnexpectedType {
                expected,
                found: block.typ,
            });
        }
        if used != src.len() {
            return Err(TlvError::TrailingBytes(src.len() - used));
        }
        Ok(block)
    }

    /// Parse the value as a sequence of nested elements.
    ///
    /// # Errors
    ///
    /// Returns the first decode failure among the children.
    pub fn children(&self) -> Result<Vec<Block>, TlvError> {
        let mut out = Vec::new();
        let mut rest = self.value.clone();
        while !rest.is_empty() {
            let (child, used) = Self::decode(&rest)?;
            out.push(child);
            rest = rest.slice(used..);
        }
        Ok(out)
    }

    /// Interpret the value as a NonNegativeInteger.
    ///
    /// # Errors
    ///
    /// Returns [`TlvError::InvalidNonNegativeInteger`] on a bad length.
    pub fn as_nni(&self) -> Result<u64, TlvError> { read_nni(&self.value) }

    /// Whether an unrecognised element of this type may be skipped.
    ///
    /// Types up to 31 are always critical; above that, odd types are critical.
    #[must_use]
    pub fn is_critical(&self) -> bool { self.typ <= 31 || self.typ % 2 == 1 }
}

/// Incremental builder for TLV values.
#[derive(Debug, Default)]
pub struct TlvWriter {
    buf: BytesMut,
}

impl TlvWriter {
    /// Start an empty writer.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Append an element with a raw value.
    pub fn put(&mut self, typ: u32, value: &[u8]) -> &mut Self {
        put_var_number(&mut self.buf, u64::from(typ));
        put_var_number(&mut self.buf, value.len() as u64);
        self.buf.put_slice(value);
        self
    }

    /// Append an element whose value is a NonNegativeInteger.
    pub fn put_nni(&mut self, typ: u32, value: u64) -> &mut Self {
        put_var_number(&mut self.buf, u64::from(typ));
        put_var_number(&mut self.buf, nni_len(value) as u64);
        put_nni(&mut self.buf, value);
        self
    }

    /// Append a NonNegativeInteger element only when `value` is present.
    pub fn put_opt_nni(&mut self, typ: u32, value: Option<u64>) -> &mut Self {
        if let Some(value) = value {
            self.put_nni(typ, value);
        }
        self
    }

    /// Append an already-built element.
    pub fn put_block(&mut self, block: &Block) -> &mut Self {
        block.encode_into(&mut self.buf);
        self
    }

    /// Append pre-encoded elements verbatim.
    pub fn put_raw(&mut self, encoded: &[u8]) -> &mut Self {
        self.buf.put_slice(encoded);
        self
    }

    /// Append an element whose value is produced by `build`.
    pub fn put_nested(&mut self, typ: u32, build: impl FnOnce(&mut TlvWriter)) -> &mut Self {
        let mut inner = TlvWriter::new();
        build(&mut inner);
        self.put(typ, &inner.buf)
    }

    /// Bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize { self.buf.len() }

    /// Whether nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.buf.is_empty() }

    /// Finish as raw value bytes.
    #[must_use]
    pub fn into_bytes(self) -> Bytes { self.buf.freeze() }

    /// Finish by wrapping everything written in an outer element of `typ`.
    #[must_use]
    pub fn into_block(self, typ: u32) -> Block { Block::new(typ, self.buf.freeze()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_blocks_round_trip() {
        let mut writer = TlvWriter::new();
        writer
            .put(0x08, b"localhost")
            .put_nni(0x69, 300)
            .put_nested(0x07, |name| {
                name.put(0x08, b"a");
            });
        let outer = writer.into_block(0x68);
        let wire = outer.to_bytes();

        let (decoded, used) = Block::decode(&wire).expect("decode outer");
        assert_eq!(used, wire.len());
        let children = decoded.children().expect("children");
        assert_eq!(children.len(), 3);
        assert_eq!(children[0].value().as_ref(), b"localhost");
        assert_eq!(children[1].as_nni(), Ok(300));
        assert_eq!(children[2].children().expect("inner").len(), 1);
    }

    #[test]
    fn decode_reports_truncation() {
        let wire = Bytes::from_static(&[0x05, 0x04, 0x01]);
        assert_eq!(
            Block::decode(&wire),
            Err(TlvError::Truncated {
                needed: 6,
                available: 3,
            })
        );
    }

    #[test]
    fn decode_exact_checks_type() {
        let wire = Block::new(0x06, Bytes::new()).to_bytes();
        assert_eq!(
            Block::decode_exact(&wire, 0x05),
            Err(TlvError::UnexpectedType {
                expected: 0x05,
                found: 0x06,
            })
        );
    }

    #[test]
    fn decode_exact_rejects_trailing_bytes() {
        let mut wire = Block::new(0x05, &b"ab"[..]).to_bytes().to_vec();
        wire.extend_from_slice(&[0x01, 0x00]);
        assert_eq!(
            Block::decode_exact(&Bytes::from(wire), 0x05),
            Err(TlvError::TrailingBytes(2))
        );
    }

    #[test]
    fn criticality_follows_type_parity() {
        assert!(Block::new(0x0A, Bytes::new()).is_critical());
        assert!(Block::new(0x21, Bytes::new()).is_critical());
        assert!(!Block::new(0x22, Bytes::new()).is_critical());
    }
}
