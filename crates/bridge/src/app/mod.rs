//! The application side of the calling convention.
//!
//! An application is anything that accepts a normalized [`Environment`] and
//! returns a [`ResponseTriple`] — status, ordered headers, body. The triple
//! is produced once and consumed exactly once by response assembly.
//!
//! Applications are infallible by contract: any application-level error must
//! already be encoded into the triple (a 500 with a body, typically) before
//! it reaches the adapter.
//!
//! # Example
//!
//! ```
//! use micro_bridge::app::ResponseTriple;
//! use micro_bridge::app::body::ChunkedBody;
//! use micro_bridge::environ::{Environment, key};
//!
//! fn hello(env: Environment) -> ResponseTriple {
//!     let path = env.str_var(key::PATH_INFO).unwrap_or("/").to_owned();
//!     ResponseTriple::new(200)
//!         .header("content-type", "text/plain")
//!         .body(ChunkedBody::from(format!("hello from {path}\n")))
//! }
//!
//! let triple = hello(Environment::new());
//! assert_eq!(triple.status, 200);
//! ```

use crate::environ::Environment;
use std::fmt;
use std::io;
use std::io::Write;

pub mod body;

pub use body::{ChunkedBody, EmptyBody, FileBody, ResponseBody};

/// The application callable.
pub trait Application: Send + Sync {
    fn call(&self, env: Environment) -> ResponseTriple;
}

impl<F> Application for F
where
    F: Fn(Environment) -> ResponseTriple + Send + Sync,
{
    fn call(&self, env: Environment) -> ResponseTriple {
        self(env)
    }
}

/// The partial-hijack callable an application plants under the
/// `rack.hijack` header name.
///
/// When present it is the signal that the application writes the raw
/// response bytes itself — status line, headers and body. Consumed once.
pub struct HijackHandler {
    f: Box<dyn FnOnce(&mut dyn Write) -> io::Result<()> + Send>,
}

impl HijackHandler {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(&mut dyn Write) -> io::Result<()> + Send + 'static,
    {
        Self { f: Box::new(f) }
    }

    /// Hand the raw sink to the application. All subsequent writes on the
    /// connection belong to it.
    pub fn run(self, sink: &mut dyn Write) -> io::Result<()> {
        (self.f)(sink)
    }
}

impl fmt::Debug for HijackHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HijackHandler").finish_non_exhaustive()
    }
}

/// A value in the triple's header mapping: ordinary text, or the hijack
/// handler hiding under its reserved name.
#[derive(Debug)]
pub enum HeaderValue {
    Text(String),
    Handler(HijackHandler),
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<HijackHandler> for HeaderValue {
    fn from(handler: HijackHandler) -> Self {
        Self::Handler(handler)
    }
}

/// The `(status, headers, body)` return contract.
///
/// `headers` is an ordered mapping; repeated values for one name are encoded
/// as newline-joined text, the way the calling convention expects them.
pub struct ResponseTriple {
    pub status: u16,
    pub headers: Vec<(String, HeaderValue)>,
    pub body: Option<Box<dyn ResponseBody>>,
}

impl ResponseTriple {
    pub fn new(status: u16) -> Self {
        Self { status, headers: Vec::new(), body: None }
    }

    pub fn header<V: Into<HeaderValue>>(mut self, name: &str, value: V) -> Self {
        self.headers.push((name.to_owned(), value.into()));
        self
    }

    /// Plant a partial-hijack handler under its reserved header name.
    pub fn hijack(self, handler: HijackHandler) -> Self {
        self.header(crate::environ::key::HIJACK, handler)
    }

    pub fn body<B: ResponseBody + 'static>(mut self, body: B) -> Self {
        self.body = Some(Box::new(body));
        self
    }
}

impl fmt::Debug for ResponseTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseTriple")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}
