use bytes::{Buf, Bytes, BytesMut};
use futures_util::{Stream, StreamExt};

use crate::error::{DecodeError, Error};

/// Pull buffer over the upstream chunk stream.
///
/// Only holds bytes that have arrived but not yet been consumed, so its peak
/// size is bounded by the largest header plus one upstream chunk.
pub(crate) struct InputBuffer<S> {
    source: S,
    buf: BytesMut,
    eof: bool,
    consumed: u64,
    high_water: usize,
}

impl<S, E> InputBuffer<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    pub fn new(source: S) -> Self {
        Self {
            source,
            buf: BytesMut::new(),
            eof: false,
            consumed: 0,
            high_water: 0,
        }
    }

    /// Append the next non-empty upstream chunk. Returns `false` at end of input.
    pub async fn pull(&mut self) -> Result<bool, DecodeError<E>> {
        while !self.eof {
            match self.source.next().await {
                Some(Ok(chunk)) if chunk.is_empty() => continue,
                Some(Ok(chunk)) => {
                    self.buf.extend_from_slice(&chunk);
                    self.high_water = self.high_water.max(self.buf.len());
                    return Ok(true);
                }
                Some(Err(e)) => return Err(DecodeError::Source(e)),
                None => self.eof = true,
            }
        }
        Ok(false)
    }

    /// Buffer at least `n` bytes. Returns `false` if input ends first.
    pub async fn fill(&mut self, n: usize) -> Result<bool, DecodeError<E>> {
        while self.buf.len() < n {
            if !self.pull().await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Like [`fill`](Self::fill), but running out of input is an error.
    pub async fn require(&mut self, n: usize) -> Result<(), DecodeError<E>> {
        if self.fill(n).await? {
            Ok(())
        } else {
            Err(self.truncated().into())
        }
    }

    /// Make sure at least one byte is buffered.
    pub async fn require_any(&mut self) -> Result<(), DecodeError<E>> {
        self.require(1).await
    }

    pub fn truncated(&self) -> Error {
        Error::Truncated {
            offset: self.consumed + self.buf.len() as u64,
        }
    }
}

impl<S> InputBuffer<S> {
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn advance(&mut self, n: usize) {
        self.buf.advance(n);
        self.consumed += n as u64;
    }

    /// Split off the first `n` buffered bytes without copying.
    pub fn take(&mut self, n: usize) -> Bytes {
        self.consumed += n as u64;
        self.buf.split_to(n).freeze()
    }

    /// Archive offset of the first buffered byte.
    pub fn position(&self) -> u64 {
        self.consumed
    }

    pub fn high_water_mark(&self) -> usize {
        self.high_water
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use futures_util::stream;

    use super::*;

    fn input(parts: &[&'static [u8]]) -> InputBuffer<impl Stream<Item = Result<Bytes, Infallible>> + Unpin> {
        let items: Vec<Result<Bytes, Infallible>> =
            parts.iter().map(|p| Ok(Bytes::from_static(p))).collect();
        InputBuffer::new(stream::iter(items))
    }

    #[tokio::test]
    async fn fill_pulls_until_enough_bytes() {
        let mut buf = input(&[b"ab", b"", b"cd", b"ef"]);
        assert!(buf.fill(3).await.unwrap());
        assert_eq!(buf.as_slice(), b"abcd");
        assert_eq!(buf.high_water_mark(), 4);

        buf.advance(3);
        assert_eq!(buf.position(), 3);
        assert_eq!(buf.take(1), "d");
        assert!(buf.is_empty());
        assert!(!buf.fill(3).await.unwrap());
        assert_eq!(buf.as_slice(), b"ef");
    }

    #[tokio::test]
    async fn require_reports_truncation_offset() {
        let mut buf = input(&[b"abc"]);
        buf.require(2).await.unwrap();
        buf.advance(1);
        let err = buf.require(10).await.unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Archive(Error::Truncated { offset: 3 })
        ));
    }

    #[tokio::test]
    async fn source_errors_pass_through() {
        let items: Vec<Result<Bytes, &'static str>> = vec![Ok(Bytes::from_static(b"x")), Err("reset")];
        let mut buf = InputBuffer::new(stream::iter(items));
        assert!(buf.pull().await.unwrap());
        assert!(matches!(buf.pull().await, Err(DecodeError::Source("reset"))));
    }
}
