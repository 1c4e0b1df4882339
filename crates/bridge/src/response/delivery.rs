//! The three body delivery strategies and the write phase that runs them.
//!
//! Exactly one [`BodyVariant`] is selected per response at assembly time;
//! once selected it is immutable and consumed exactly once here. A write
//! failure mid-stream propagates straight to the engine's connection
//! handling — flushed bytes cannot be rolled back, so there is no retry and
//! no partial-chunk recovery.

use crate::app::body::ResponseBody;
use crate::app::HijackHandler;
use crate::engine::NativeResponse;
use crate::response::WriteOptions;
use bytes::Bytes;
use std::fmt;
use std::fs::File;
use std::io;
use std::io::Write;
use std::path::PathBuf;
use tracing::warn;

/// An application body on its way out, with guaranteed cleanup: whenever
/// this drops — after delivery, or on any earlier failure path — the wrapped
/// body's `close` runs exactly once.
pub struct IterableBody {
    inner: Option<Box<dyn ResponseBody>>,
}

impl IterableBody {
    pub(crate) fn new(body: Option<Box<dyn ResponseBody>>) -> Self {
        Self { inner: body }
    }

    pub(crate) fn file_path(&self) -> Option<PathBuf> {
        self.inner.as_ref().and_then(|body| body.file_path())
    }

    pub fn next_chunk(&mut self) -> Option<Bytes> {
        self.inner.as_mut().and_then(|body| body.next_chunk())
    }
}

impl Drop for IterableBody {
    fn drop(&mut self) {
        if let Some(mut body) = self.inner.take()
            && let Err(e) = body.close()
        {
            // Cleanup is best effort; the response outcome stands.
            warn!(cause = %e, "response body close failed");
        }
    }
}

impl fmt::Debug for IterableBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterableBody")
            .field("present", &self.inner.is_some())
            .finish()
    }
}

/// The delivery strategy selected for one response.
#[derive(Debug)]
pub enum BodyVariant {
    /// The application writes the raw bytes itself — status line, headers
    /// and body. The status and header mutations already applied to the
    /// native response are discarded on this path; that is the documented
    /// trade-off of handing over the sink.
    Hijack(HijackHandler),
    /// The engine streams the opened file; the adapter only supplied the
    /// handle.
    FileHandle(File),
    /// Chunks written to the sink one at a time, verbatim.
    Iterable(IterableBody),
}

/// The write phase: preamble, then body bytes, per the selected variant.
///
/// Headers are fully assembled before any body byte goes out — except on the
/// hijack path, where the application takes responsibility for all ordering
/// and the engine preamble is skipped entirely.
pub fn deliver<R: NativeResponse + ?Sized>(
    res: &mut R,
    sink: &mut dyn Write,
    options: WriteOptions,
) -> io::Result<()> {
    match res.take_body() {
        Some(BodyVariant::Hijack(handler)) => handler.run(sink),
        Some(BodyVariant::FileHandle(mut file)) => {
            emit_preamble(res, sink, options)?;
            io::copy(&mut file, sink)?;
            sink.flush()
        }
        Some(BodyVariant::Iterable(mut body)) => {
            emit_preamble(res, sink, options)?;
            while let Some(chunk) = body.next_chunk() {
                // No added framing: that is either the transport's job or
                // already embedded in the chunk by the application.
                sink.write_all(&chunk)?;
            }
            sink.flush()
        }
        None => {
            emit_preamble(res, sink, options)?;
            sink.flush()
        }
    }
}

fn emit_preamble<R: NativeResponse + ?Sized>(
    res: &mut R,
    sink: &mut dyn Write,
    options: WriteOptions,
) -> io::Result<()> {
    if !options.app_owns_chunking {
        return res.write_preamble(sink);
    }

    // The application claims the chunk framing: keep the engine's automatic
    // chunking out of the serialized preamble, then restore the switch so
    // the connection still delimits the body bytes correctly.
    let engine_framing = res.auto_chunking();
    res.set_auto_chunking(false);
    let result = res.write_preamble(sink);
    res.set_auto_chunking(engine_framing);
    result
}
