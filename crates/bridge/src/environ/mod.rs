//! The normalized per-request environment handed to the application.
//!
//! An [`Environment`] is built fresh for every request by
//! [`Environment::from_request`], owned by that request's processing and
//! discarded once the application callable returns. It is a string-keyed
//! mapping of request metadata plus three typed slots that do not fit a
//! string map: the request input stream, the error sink and the hijack
//! capability descriptor.
//!
//! Two invariants hold for the mapping:
//!
//! - a key is either present with a value or absent, never stored as null
//! - the required keys (`HTTP_VERSION`, `QUERY_STRING`, `PATH_INFO`,
//!   `REQUEST_PATH`, the scheme and the concurrency flags) are always
//!   present, defaulted when the engine's request omits them

use crate::error::BridgeError;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::io::Read;
use tracing::error;

mod translate;

/// Version of the calling convention advertised under [`key::VERSION`].
pub const PROTOCOL_VERSION: &str = "1.3";

/// The literal environment key names.
///
/// The stream-valued keys (`rack.input`, `rack.errors`, `rack.hijack`,
/// `rack.hijack_io`) are reached through the typed accessors on
/// [`Environment`] rather than the string map.
pub mod key {
    pub const VERSION: &str = "rack.version";
    pub const INPUT: &str = "rack.input";
    pub const ERRORS: &str = "rack.errors";
    pub const MULTITHREAD: &str = "rack.multithread";
    pub const MULTIPROCESS: &str = "rack.multiprocess";
    pub const RUN_ONCE: &str = "rack.run_once";
    pub const URL_SCHEME: &str = "rack.url_scheme";
    pub const IS_HIJACK: &str = "rack.hijack?";
    pub const HIJACK: &str = "rack.hijack";
    pub const HIJACK_IO: &str = "rack.hijack_io";

    pub const HTTP_VERSION: &str = "HTTP_VERSION";
    pub const SERVER_PROTOCOL: &str = "SERVER_PROTOCOL";
    pub const QUERY_STRING: &str = "QUERY_STRING";
    pub const PATH_INFO: &str = "PATH_INFO";
    pub const REQUEST_PATH: &str = "REQUEST_PATH";
    pub const SCRIPT_NAME: &str = "SCRIPT_NAME";
    pub const HTTPS: &str = "HTTPS";
}

/// A value in the environment mapping. Absent keys are simply absent; there
/// is no null variant by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvValue {
    Str(String),
    Bool(bool),
}

impl EnvValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Str(_) => None,
        }
    }
}

impl From<String> for EnvValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&str> for EnvValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<bool> for EnvValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// The application's error stream (`rack.errors`).
///
/// Forwards whatever the application writes into the tracing stack,
/// line-trimmed. Best effort: writing never fails.
#[derive(Debug, Default)]
pub struct ErrorSink;

impl ErrorSink {
    pub fn new() -> Self {
        Self
    }
}

impl io::Write for ErrorSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        let text = text.trim_end_matches(['\r', '\n']);
        if !text.is_empty() {
            error!(target: "micro_bridge::app", "{text}");
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A raw connection handle, as full hijacking would hand out.
///
/// Never constructed: only the response phase can be hijacked here, so the
/// `rack.hijack_io` slot stays empty and [`HijackSupport::full`] refuses.
#[derive(Debug)]
pub struct RawIo {
    _priv: (),
}

/// The hijack capability descriptor (`rack.hijack?` / `rack.hijack` /
/// `rack.hijack_io`).
#[derive(Debug, Default)]
pub struct HijackSupport {
    io: Option<RawIo>,
}

impl HijackSupport {
    pub(crate) fn new() -> Self {
        Self { io: None }
    }

    /// Whether hijacking is advertised to the application (`rack.hijack?`).
    /// Always true: partial hijack via the response headers is supported.
    pub fn available(&self) -> bool {
        true
    }

    /// Request the full-connection hijack (`rack.hijack`).
    ///
    /// Always refused with [`BridgeError::FullHijackUnsupported`]; connection
    /// accept and parse stay engine-owned. Calling this is a caller bug, not
    /// a runtime condition.
    pub fn full(&self) -> Result<RawIo, BridgeError> {
        Err(BridgeError::FullHijackUnsupported)
    }

    /// The raw connection slot (`rack.hijack_io`). Always empty.
    pub fn io(&self) -> Option<&RawIo> {
        self.io.as_ref()
    }
}

/// The normalized environment mapping. See the module docs.
pub struct Environment {
    vars: HashMap<String, EnvValue>,
    input: Box<dyn Read + Send>,
    errors: ErrorSink,
    hijack: HijackSupport,
}

impl Environment {
    /// An empty environment with no metadata and an empty input stream.
    /// Request processing always goes through [`Environment::from_request`];
    /// this exists so applications can be exercised by hand.
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
            input: Box::new(io::empty()),
            errors: ErrorSink::new(),
            hijack: HijackSupport::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&EnvValue> {
        self.vars.get(key)
    }

    /// String value under `key`, if present and string-valued.
    pub fn str_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).and_then(EnvValue::as_str)
    }

    /// Boolean value under `key`, if present and boolean-valued.
    pub fn bool_var(&self, key: &str) -> Option<bool> {
        self.vars.get(key).and_then(EnvValue::as_bool)
    }

    pub fn insert<V: Into<EnvValue>>(&mut self, key: &str, value: V) {
        self.vars.insert(key.to_owned(), value.into());
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EnvValue)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The request body as a binary stream (`rack.input`).
    pub fn input(&mut self) -> &mut (dyn Read + Send) {
        &mut *self.input
    }

    /// The application error stream (`rack.errors`).
    pub fn errors(&mut self) -> &mut ErrorSink {
        &mut self.errors
    }

    /// The hijack capability descriptor.
    pub fn hijack(&self) -> &HijackSupport {
        &self.hijack
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("vars", &self.vars)
            .field("hijack", &self.hijack)
            .finish_non_exhaustive()
    }
}
