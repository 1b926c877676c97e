use bytes::Bytes;
use flate2::{Decompress, FlushDecompress, Status};
use futures_util::Stream;

use crate::error::{DecodeError, Error};
use crate::input::InputBuffer;

/// Raw-deflate expansion that yields output as soon as it is produced.
///
/// The deflate stream is self-terminating, so this is also what finds the
/// end of an entry whose sizes were deferred to a data descriptor.
pub(crate) struct Inflater {
    inner: Decompress,
    out_chunk: usize,
    done: bool,
}

impl Inflater {
    pub fn new(out_chunk: usize) -> Self {
        Self {
            inner: Decompress::new(false),
            out_chunk: out_chunk.max(1),
            done: false,
        }
    }

    /// Compressed bytes consumed so far.
    pub fn total_in(&self) -> u64 {
        self.inner.total_in()
    }

    /// Produce the next chunk of at most `out_chunk` bytes, or `None` once
    /// the deflate stream has ended.
    ///
    /// Returns early with whatever output exists when the buffered input runs
    /// dry, rather than waiting on the network to fill a whole chunk.
    pub async fn next_chunk<S, E>(
        &mut self,
        input: &mut InputBuffer<S>,
        name: &str,
    ) -> Result<Option<Bytes>, DecodeError<E>>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
    {
        if self.done {
            return Ok(None);
        }

        let mut out = Vec::with_capacity(self.out_chunk);
        loop {
            if input.is_empty() {
                if !out.is_empty() {
                    return Ok(Some(Bytes::from(out)));
                }
                input.require_any().await?;
            }

            let before_in = self.inner.total_in();
            let before_out = self.inner.total_out();
            let status = self
                .inner
                .decompress_vec(input.as_slice(), &mut out, FlushDecompress::None)
                .map_err(|e| Error::Inflate {
                    name: name.to_string(),
                    message: e.to_string(),
                })?;
            let consumed = (self.inner.total_in() - before_in) as usize;
            let produced = self.inner.total_out() - before_out;
            input.advance(consumed);

            match status {
                Status::StreamEnd => {
                    self.done = true;
                    return Ok((!out.is_empty()).then(|| Bytes::from(out)));
                }
                Status::Ok | Status::BufError => {
                    if out.len() == out.capacity() {
                        return Ok(Some(Bytes::from(out)));
                    }
                    if consumed == 0 && produced == 0 && !input.is_empty() {
                        return Err(Error::Stalled {
                            name: name.to_string(),
                        }
                        .into());
                    }
                }
            }
        }
    }
}
