//! Framing for back-to-back JSON objects.
//!
//! The backend writes one JSON object per message with no delimiter, so the
//! decoder finds boundaries by running the JSON parser over the buffered
//! bytes and splitting off whatever it consumed.

use std::marker::PhantomData;

use bytes::{Buf, BufMut, BytesMut};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Deserializer;
use tokio_util::codec::{Decoder, Encoder};

use super::BackendError;

/// Default ceiling on one buffered JSON object.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Codec for concatenated JSON values of type `T`.
#[derive(Debug)]
pub struct JsonStreamCodec<T> {
    max_message_size: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonStreamCodec<T> {
    /// Construct a codec that refuses to buffer more than `max_message_size`
    /// bytes of one incomplete object.
    #[must_use]
    pub fn new(max_message_size: usize) -> Self {
        Self {
            max_message_size,
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonStreamCodec<T> {
    fn default() -> Self { Self::new(DEFAULT_MAX_MESSAGE_SIZE) }
}

impl<T: DeserializeOwned> Decoder for JsonStreamCodec<T> {
    type Item = T;
    type Error = BackendError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let (next, consumed) = {
            let mut stream = Deserializer::from_slice(&src[..]).into_iter::<T>();
            let next = stream.next();
            (next, stream.byte_offset())
        };
        match next {
            Some(Ok(value)) => {
                src.advance(consumed);
                Ok(Some(value))
            }
            Some(Err(err)) if err.is_eof() => {
                if src.len() > self.max_message_size {
                    tracing::warn!(
                        buffered = src.len(),
                        limit = self.max_message_size,
                        "discarding oversized backend message"
                    );
                    src.clear();
                }
                Ok(None)
            }
            Some(Err(err)) => {
                // No way to find the next object boundary in garbage.
                tracing::warn!(error = %err, discarded = src.len(), "malformed backend message");
                crate::metrics::inc_backend_errors("malformed");
                src.clear();
                Ok(None)
            }
            None => {
                // Only whitespace left.
                src.clear();
                Ok(None)
            }
        }
    }
}

impl<T: Serialize> Encoder<T> for JsonStreamCodec<T> {
    type Error = BackendError;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        serde_json::to_writer(dst.writer(), &item).map_err(BackendError::Encode)
    }
}
