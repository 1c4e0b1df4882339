//! Response assembly: the application's triple → the engine's native
//! response object, plus the write-phase options.
//!
//! Assembly mutates the native response in place (status, header table,
//! cookie list, body handle) and resolves the body into one of the three
//! delivery variants — hijack, file handle, chunk iterable — exactly once.
//! The transfer-encoding override comes back to the caller as an explicit
//! [`WriteOptions`] flag for the write path rather than anything baked into
//! the response object.
//!
//! Header rules, per `(name, value)` entry:
//!
//! - the reserved `rack.hijack` name carries the partial-hijack handler; it
//!   is captured, never written as an HTTP header
//! - `set-cookie` (case-insensitive) values split on newline into one cookie
//!   entry per line, since the engine's header table cannot repeat a name
//! - every other value folds embedded newlines into a single
//!   comma-separated header line
//!
//! Whatever happens in between, the application body's `close` runs exactly
//! once: immediately for the hijack and file variants, after delivery for the
//! iterable one.

use crate::app::{HeaderValue, ResponseTriple};
use crate::engine::NativeResponse;
use crate::environ::key;
use crate::error::BridgeError;
use http::header::{SET_COOKIE, TRANSFER_ENCODING};
use std::fs::File;
use tracing::warn;

pub mod delivery;

pub use delivery::{BodyVariant, IterableBody, deliver};

/// Write-phase configuration produced by [`assemble`] and consumed by
/// [`deliver`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// The application declared `transfer-encoding: chunked` and its body is
    /// not the engine's own file pass-through: the engine's automatic
    /// chunking must stay out of the preamble, while the connection framing
    /// still applies to the body bytes.
    pub app_owns_chunking: bool,
}

/// Assemble the engine's native response from the application's triple.
///
/// Returns the [`WriteOptions`] the engine must hand to the write phase. An
/// error means the engine rejected a header mutation or a file body could
/// not be opened; either way the response preamble has not been written yet
/// and the connection handling stays with the engine.
pub fn assemble<R: NativeResponse + ?Sized>(
    triple: ResponseTriple,
    res: &mut R,
) -> Result<WriteOptions, BridgeError> {
    let ResponseTriple { status, headers, body } = triple;
    // Close-on-drop from here on: the guard covers every early return below.
    let body = IterableBody::new(body);

    res.set_status(status);

    let mut hijack = None;
    let mut app_chunked = false;
    for (name, value) in headers {
        if name == key::HIJACK {
            // The handler is the signal that the application performs the
            // response writes itself; it never appears on the wire.
            match value {
                HeaderValue::Handler(handler) => hijack = Some(handler),
                HeaderValue::Text(_) => {
                    warn!(header = %name, "text value under the hijack name, dropping");
                }
            }
            continue;
        }

        let HeaderValue::Text(text) = value else {
            warn!(header = %name, "handler value under an ordinary header name, dropping");
            continue;
        };

        if name.eq_ignore_ascii_case(SET_COOKIE.as_str()) {
            for cookie in text.split('\n').filter(|line| !line.is_empty()) {
                res.append_cookie(cookie);
            }
            continue;
        }

        if name.eq_ignore_ascii_case(TRANSFER_ENCODING.as_str())
            && text.to_ascii_lowercase().contains("chunked")
        {
            app_chunked = true;
        }

        let folded = text.split('\n').collect::<Vec<_>>().join(", ");
        res.set_header(&name, &folded)
            .map_err(|source| BridgeError::header(&name, source))?;
    }

    let variant = if let Some(handler) = hijack {
        BodyVariant::Hijack(handler)
    } else if let Some(path) = body.file_path() {
        let file = File::open(&path).map_err(|source| BridgeError::open_file_body(path, source))?;
        BodyVariant::FileHandle(file)
    } else {
        BodyVariant::Iterable(body)
    };

    let app_owns_chunking = app_chunked && !matches!(variant, BodyVariant::FileHandle(_));
    res.set_body(variant);
    Ok(WriteOptions { app_owns_chunking })
}
