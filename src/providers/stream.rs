//! Stream operators for chunked synthesis responses.

use bytes::{BufMut, Bytes, BytesMut};
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::Result;

/// Realigns a byte-chunk stream to 16-bit frame boundaries.
///
/// HTTP chunking splits PCM streams on arbitrary byte boundaries, so a chunk
/// can end mid-sample. An odd trailing byte is carried into the next chunk;
/// a dangling byte at end of stream is zero-padded to a full frame.
pub(crate) struct FrameAligned<S> {
    inner: S,
    carry: Option<u8>,
    done: bool,
}

impl<S> FrameAligned<S> {
    pub(crate) fn new(inner: S) -> Self {
        Self {
            inner,
            carry: None,
            done: false,
        }
    }
}

impl<S> Stream for FrameAligned<S>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
{
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        loop {
            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    let mut combined = BytesMut::with_capacity(chunk.len() + 1);
                    if let Some(b) = this.carry.take() {
                        combined.put_u8(b);
                    }
                    combined.extend_from_slice(&chunk);
                    if combined.len() % 2 == 1 {
                        this.carry = combined.split_off(combined.len() - 1).first().copied();
                    }
                    if combined.is_empty() {
                        continue;
                    }
                    return Poll::Ready(Some(Ok(combined.freeze())));
                }
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Some(Err(e))),
                Poll::Ready(None) => {
                    this.done = true;
                    if let Some(b) = this.carry.take() {
                        return Poll::Ready(Some(Ok(Bytes::from(vec![b, 0]))));
                    }
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{executor::block_on, stream, StreamExt};

    fn run(parts: Vec<&[u8]>) -> Vec<Vec<u8>> {
        let inner = stream::iter(
            parts
                .into_iter()
                .map(|p| Ok(Bytes::copy_from_slice(p)))
                .collect::<Vec<Result<Bytes>>>(),
        );
        let aligned = FrameAligned::new(inner);
        block_on(aligned.map(|r| r.unwrap().to_vec()).collect::<Vec<_>>())
    }

    #[test]
    fn even_chunks_pass_through() {
        let out = run(vec![&[1, 2, 3, 4], &[5, 6]]);
        assert_eq!(out, vec![vec![1, 2, 3, 4], vec![5, 6]]);
    }

    #[test]
    fn odd_byte_carries_into_next_chunk() {
        let out = run(vec![&[1, 2, 3], &[4, 5, 6]]);
        assert_eq!(out, vec![vec![1, 2], vec![3, 4, 5, 6]]);
    }

    #[test]
    fn dangling_final_byte_is_zero_padded() {
        let out = run(vec![&[1, 2, 3]]);
        assert_eq!(out, vec![vec![1, 2], vec![3, 0]]);
    }

    #[test]
    fn single_byte_chunks_accumulate() {
        let out = run(vec![&[1], &[2], &[3]]);
        assert_eq!(out, vec![vec![1, 2], vec![3, 0]]);
    }

    #[test]
    fn empty_chunks_are_skipped() {
        let out = run(vec![&[], &[1, 2], &[]]);
        assert_eq!(out, vec![vec![1, 2]]);
    }
}
