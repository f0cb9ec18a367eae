//! Byte source implementing spec §4.2: buffered lookahead over a pull
//! callback, with block-mode (page > 1) and byte-mode (page = 1) refill.

use rdf_api::sink::ByteSource;
use rdf_api::status::Status;

/// Reads bytes from an in-memory caller-owned buffer, used by the
/// callback-based adapter below and directly by callers who already hold
/// the whole document in memory.
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
    line: u32,
    col: u32,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            line: 1,
            col: 0,
        }
    }
}

impl ByteSource for SliceSource<'_> {
    fn peek(&mut self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn advance(&mut self) -> Result<(), Status> {
        if let Some(&b) = self.data.get(self.pos) {
            self.pos += 1;
            if b == b'\n' {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += 1;
            }
        }
        Ok(())
    }

    fn line(&self) -> u32 {
        self.line
    }

    fn col(&self) -> u32 {
        self.col
    }
}

/// User callback pair: `read` pulls up to `buf.len()` bytes and returns how
/// many it actually produced (0 at EOF); `error` returns non-zero on a
/// permanent stream fault (spec §6).
pub trait ReadCallback {
    fn read(&mut self, buf: &mut [u8]) -> usize;
    fn error(&mut self) -> i32 {
        0
    }
}

impl<R: std::io::Read> ReadCallback for R {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        std::io::Read::read(self, buf).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EofState {
    NotAtEof,
    /// `read` returned 0 with no error: sticky until a later call returns
    /// more data (spec §4.2, "transiently return 0").
    Transient,
    /// `error` returned nonzero: permanent, reported as `BAD_STREAM`.
    Permanent,
}

/// Adapts a [`ReadCallback`] into a [`ByteSource`] with a page-sized
/// buffer. `page_size == 1` runs byte mode (refill reads exactly one byte);
/// `page_size > 1` runs block mode (refill reads up to one page).
pub struct CallbackByteSource<R> {
    read: R,
    page_size: usize,
    buf: Vec<u8>,
    head: usize,
    filled: usize,
    eof: EofState,
    line: u32,
    col: u32,
}

impl<R: ReadCallback> CallbackByteSource<R> {
    pub fn new(read: R, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            read,
            page_size,
            buf: vec![0; page_size],
            head: 0,
            filled: 0,
            eof: EofState::NotAtEof,
            line: 1,
            col: 0,
        }
    }

    /// A zero-length read is ambiguous between "transiently no data yet"
    /// and "permanently exhausted" (spec §4.2); we retry a bounded number
    /// of times within one refill so a source that pauses briefly before
    /// delivering more data is not mistaken for true EOF, without risking
    /// an unbounded spin on a source that is genuinely done.
    const MAX_ZERO_READ_RETRIES: u32 = 4;

    fn refill(&mut self) {
        if self.read.error() != 0 {
            self.eof = EofState::Permanent;
            return;
        }
        for _ in 0..=Self::MAX_ZERO_READ_RETRIES {
            let n = self.read.read(&mut self.buf[..self.page_size]);
            if n > 0 {
                self.eof = EofState::NotAtEof;
                self.head = 0;
                self.filled = n;
                return;
            }
            if self.read.error() != 0 {
                self.eof = EofState::Permanent;
                return;
            }
        }
        self.eof = EofState::Transient;
        self.head = 0;
        self.filled = 0;
    }
}

impl<R: ReadCallback> ByteSource for CallbackByteSource<R> {
    fn peek(&mut self) -> Option<u8> {
        if self.head >= self.filled {
            if self.eof == EofState::Permanent {
                return None;
            }
            self.refill();
            if self.filled == 0 {
                return None;
            }
        }
        Some(self.buf[self.head])
    }

    fn advance(&mut self) -> Result<(), Status> {
        if self.eof == EofState::Permanent {
            return Err(Status::ErrBadStream);
        }
        if self.head >= self.filled {
            self.refill();
            if self.eof == EofState::Permanent {
                return Err(Status::ErrBadStream);
            }
            if self.filled == 0 {
                return Ok(());
            }
        }
        let b = self.buf[self.head];
        self.head += 1;
        if b == b'\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Ok(())
    }

    fn line(&self) -> u32 {
        self.line
    }

    fn col(&self) -> u32 {
        self.col
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_source_peek_advance_tracks_cursor() {
        let mut s = SliceSource::new(b"ab\ncd");
        assert_eq!(s.peek(), Some(b'a'));
        s.advance().unwrap();
        assert_eq!(s.col(), 1);
        s.advance().unwrap();
        s.advance().unwrap();
        assert_eq!(s.line(), 2);
        assert_eq!(s.col(), 0);
        assert_eq!(s.peek(), Some(b'c'));
    }

    struct ChunkedRead {
        chunks: Vec<Vec<u8>>,
        idx: usize,
    }

    impl ReadCallback for ChunkedRead {
        fn read(&mut self, buf: &mut [u8]) -> usize {
            if self.idx >= self.chunks.len() {
                return 0;
            }
            let chunk = &self.chunks[self.idx];
            let n = chunk.len().min(buf.len());
            buf[..n].copy_from_slice(&chunk[..n]);
            self.idx += 1;
            n
        }
    }

    #[test]
    fn byte_mode_reads_one_byte_at_a_time() {
        let cb = ChunkedRead {
            chunks: vec![vec![b'a'], vec![b'b'], vec![]],
            idx: 0,
        };
        let mut src = CallbackByteSource::new(cb, 1);
        assert_eq!(src.peek(), Some(b'a'));
        src.advance().unwrap();
        assert_eq!(src.peek(), Some(b'b'));
        src.advance().unwrap();
        assert_eq!(src.peek(), None);
    }

    #[test]
    fn block_mode_survives_a_transient_zero_read() {
        let cb = ChunkedRead {
            chunks: vec![vec![b'a', b'b'], vec![], vec![b'c']],
            idx: 0,
        };
        let mut src = CallbackByteSource::new(cb, 4);
        assert_eq!(src.peek(), Some(b'a'));
        src.advance().unwrap();
        assert_eq!(src.peek(), Some(b'b'));
        src.advance().unwrap();
        // transient EOF (empty chunk), then more data arrives
        assert_eq!(src.peek(), Some(b'c'));
    }
}
