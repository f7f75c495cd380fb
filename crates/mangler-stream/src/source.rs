//! Chunk sources backed by async readers.

use std::io;

use futures_util::Stream;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Smallest read buffer; any UTF-8 sequence fits.
const MIN_CHUNK_SIZE: usize = 4;

struct ChunkReader<R> {
    reader: R,
    buf: Vec<u8>,
    /// Bytes of an incomplete UTF-8 sequence carried into the next read.
    pending: Vec<u8>,
    done: bool,
}

/// Turn an async reader into a stream of text chunks of at most roughly
/// `chunk_size` bytes.
///
/// A multi-byte character split across two reads is carried over to the
/// next chunk. Invalid UTF-8 ends the stream with an `InvalidData` error, and
/// input ending inside a character with `UnexpectedEof`.
pub fn read_chunks<R>(
    reader: R,
    chunk_size: usize,
) -> impl Stream<Item = io::Result<String>> + Unpin
where
    R: AsyncRead + Unpin,
{
    let state = ChunkReader {
        reader,
        buf: vec![0; chunk_size.max(MIN_CHUNK_SIZE)],
        pending: Vec::new(),
        done: false,
    };

    Box::pin(futures_util::stream::unfold(state, |mut state| async move {
        loop {
            if state.done {
                return None;
            }

            let read = match state.reader.read(&mut state.buf).await {
                Ok(read) => read,
                Err(err) => {
                    state.done = true;
                    return Some((Err(err), state));
                }
            };

            if read == 0 {
                state.done = true;
                if state.pending.is_empty() {
                    return None;
                }
                let err = io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "input ended inside a UTF-8 sequence",
                );
                return Some((Err(err), state));
            }

            state.pending.extend_from_slice(&state.buf[..read]);
            match take_valid_prefix(&mut state.pending) {
                Ok(Some(text)) => return Some((Ok(text), state)),
                Ok(None) => continue,
                Err(err) => {
                    state.done = true;
                    return Some((Err(err), state));
                }
            }
        }
    }))
}

/// Split off the longest valid UTF-8 prefix of `pending`, leaving an
/// incomplete trailing sequence in place.
fn take_valid_prefix(pending: &mut Vec<u8>) -> io::Result<Option<String>> {
    let valid = match std::str::from_utf8(pending) {
        Ok(_) => pending.len(),
        Err(err) if err.error_len().is_none() => err.valid_up_to(),
        Err(err) => return Err(io::Error::new(io::ErrorKind::InvalidData, err)),
    };

    if valid == 0 {
        return Ok(None);
    }

    let rest = pending.split_off(valid);
    let bytes = std::mem::replace(pending, rest);
    String::from_utf8(bytes)
        .map(Some)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}
