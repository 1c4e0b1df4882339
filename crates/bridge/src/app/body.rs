//! Application body shapes: a sequence of byte chunks, a path-backed file,
//! or nothing at all.
//!
//! Capability probing happens exactly once, at response assembly time: a body
//! that advertises a file path is streamed through the engine's file path,
//! everything else is iterated chunk by chunk. Whatever the shape, `close`
//! runs exactly once after delivery, on success or failure.

use bytes::Bytes;
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};

/// A response body as returned by the application.
pub trait ResponseBody: Send {
    /// Next chunk of the body, `None` when exhausted. Chunks are written to
    /// the sink verbatim, in order, with no added framing.
    fn next_chunk(&mut self) -> Option<Bytes>;

    /// Path-backed bodies advertise the file they stream from; the adapter
    /// opens it for binary read and never iterates them.
    fn file_path(&self) -> Option<PathBuf> {
        None
    }

    /// Release whatever the body holds. Best effort: a failure here is
    /// logged, never allowed to mask the response outcome.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// An in-order sequence of byte chunks.
#[derive(Debug, Default)]
pub struct ChunkedBody {
    chunks: VecDeque<Bytes>,
}

impl ChunkedBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<B: Into<Bytes>>(&mut self, chunk: B) {
        self.chunks.push_back(chunk.into());
    }
}

impl ResponseBody for ChunkedBody {
    fn next_chunk(&mut self) -> Option<Bytes> {
        self.chunks.pop_front()
    }
}

impl<B: Into<Bytes>> FromIterator<B> for ChunkedBody {
    fn from_iter<I: IntoIterator<Item = B>>(iter: I) -> Self {
        Self { chunks: iter.into_iter().map(Into::into).collect() }
    }
}

impl From<&'static str> for ChunkedBody {
    fn from(value: &'static str) -> Self {
        Self { chunks: VecDeque::from([Bytes::from(value)]) }
    }
}

impl From<String> for ChunkedBody {
    fn from(value: String) -> Self {
        Self { chunks: VecDeque::from([Bytes::from(value)]) }
    }
}

impl From<Vec<Bytes>> for ChunkedBody {
    fn from(chunks: Vec<Bytes>) -> Self {
        Self { chunks: chunks.into() }
    }
}

/// A file-backed body, identified by path. The engine streams the bytes.
#[derive(Debug, Clone)]
pub struct FileBody {
    path: PathBuf,
}

impl FileBody {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResponseBody for FileBody {
    fn next_chunk(&mut self) -> Option<Bytes> {
        None
    }

    fn file_path(&self) -> Option<PathBuf> {
        Some(self.path.clone())
    }
}

/// The nil body.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyBody;

impl ResponseBody for EmptyBody {
    fn next_chunk(&mut self) -> Option<Bytes> {
        None
    }
}
