use std::io;
use std::mem;

use crate::errors::Result;

/// Outcome of a successful pull from a [`Source`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ReadOutcome {
    /// The destination was filled completely.
    Full,
    /// The stream ended before the first requested byte.
    Eof,
}

/// Pull-style byte source feeding the parser.
///
/// A source either fills the destination completely or reports `Eof`, and
/// `Eof` is only allowed when not a single byte was available. Running dry
/// halfway through a read is an error; buffering to avoid short reads is the
/// source's job.
pub trait Source {
    fn read(&mut self, dst: &mut [u8]) -> Result<ReadOutcome>;
}

/// Source over an in-memory byte slice.
#[derive(Debug)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        SliceSource { data, pos: 0 }
    }
}

impl<'a> Source for SliceSource<'a> {
    fn read(&mut self, dst: &mut [u8]) -> Result<ReadOutcome> {
        if dst.is_empty() {
            return Ok(ReadOutcome::Full);
        }

        let rest = &self.data[self.pos..];
        if rest.is_empty() {
            return Ok(ReadOutcome::Eof);
        }
        if rest.len() < dst.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input ended in the middle of a read",
            )
            .into());
        }

        dst.copy_from_slice(&rest[..dst.len()]);
        self.pos += dst.len();

        Ok(ReadOutcome::Full)
    }
}

/// Source adapter over any [`io::Read`], doing the full-read buffering loop.
#[derive(Debug)]
pub struct IoSource<R> {
    inner: R,
}

impl<R: io::Read> IoSource<R> {
    pub fn new(inner: R) -> Self {
        IoSource { inner }
    }
}

impl<R: io::Read> Source for IoSource<R> {
    fn read(&mut self, dst: &mut [u8]) -> Result<ReadOutcome> {
        let mut filled = 0;
        while filled < dst.len() {
            match self.inner.read(&mut dst[filled..]) {
                Ok(0) if filled == 0 => return Ok(ReadOutcome::Eof),
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "input ended in the middle of a read",
                    )
                    .into());
                }
                Ok(n) => filled += n,
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }
        }

        Ok(ReadOutcome::Full)
    }
}

/// Tap on the byte stream: counts every byte the source handed out and,
/// when retaining, keeps a copy. The count defines the offsets v4 signature
/// hashing works from, so it is maintained even when the copy is not.
#[derive(Debug, Default)]
pub struct Accumulator {
    retain: bool,
    buf: Vec<u8>,
    length: usize,
}

impl Accumulator {
    pub fn new(retain: bool) -> Self {
        Accumulator {
            retain,
            buf: Vec::new(),
            length: 0,
        }
    }

    pub fn retains(&self) -> bool {
        self.retain
    }

    pub fn record(&mut self, bytes: &[u8]) {
        if self.retain {
            self.buf.extend_from_slice(bytes);
        }
        self.length += bytes.len();
    }

    /// Bytes recorded since the last reset.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Hand the retained bytes over and start counting from zero.
    pub fn take(&mut self) -> Vec<u8> {
        self.length = 0;
        mem::replace(&mut self.buf, Vec::new())
    }

    pub fn reset(&mut self) {
        self.length = 0;
        self.buf.clear();
    }
}
