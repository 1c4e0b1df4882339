//! Interfaces the server engine presents to the adapter.
//!
//! The engine itself — socket accept loop, keep-alive, TLS, header parsing —
//! is a black box. The adapter only needs three things from it: a readable
//! view of its native request object, a mutable view of its native response
//! object, and a mount/run/shutdown lifecycle. These traits pin down exactly
//! that surface, nothing more.

use crate::error::BridgeError;
use crate::response::WriteOptions;
use crate::response::delivery::BodyVariant;
use crate::server::ListenConfig;
use std::io;
use std::io::{Read, Write};

/// The engine's native request object, as the adapter sees it.
pub trait NativeRequest {
    /// CGI-style request metadata pairs. A `None` value marks a field the
    /// engine parsed but holds no value for; translation strips those.
    fn meta_vars(&self) -> Vec<(String, Option<String>)>;

    /// Path component of the request URI.
    fn uri_path(&self) -> &str;

    /// The request body as a binary stream. Called at most once per request.
    fn take_body(&mut self) -> Box<dyn Read + Send>;
}

/// The engine's native response object.
///
/// The adapter mutates this in place — status, header table, cookie list,
/// body handle — but never owns its lifecycle.
pub trait NativeResponse {
    fn set_status(&mut self, status: u16);

    /// Store a single header line. Engines may reject a mutation, hence the
    /// fallible signature.
    fn set_header(&mut self, name: &str, value: &str) -> io::Result<()>;

    /// Cookies get their own list: the engine's header table cannot represent
    /// repeated header lines.
    fn append_cookie(&mut self, cookie: &str);

    /// The engine's automatic chunk-framing switch. The delivery phase toggles
    /// this around preamble emission when the application claims the framing
    /// for itself.
    fn set_auto_chunking(&mut self, enabled: bool);

    fn auto_chunking(&self) -> bool;

    fn set_body(&mut self, body: BodyVariant);

    fn take_body(&mut self) -> Option<BodyVariant>;

    /// Serialize the status line and header table to `sink`. The wire format
    /// is engine-owned; the adapter only decides when this runs.
    fn write_preamble(&mut self, sink: &mut dyn Write) -> io::Result<()>;
}

/// The per-request callback an engine invokes for every inbound request.
///
/// Returns the [`WriteOptions`] the engine must pass into the write phase.
pub type EngineHandler<E> = Box<
    dyn Fn(
            &mut <E as ServerEngine>::Request,
            &mut <E as ServerEngine>::Response,
        ) -> Result<WriteOptions, BridgeError>
        + Send
        + Sync,
>;

/// The engine lifecycle, as the shim drives it: bind, mount a single handler
/// for all paths, block in `run` until `shutdown`.
///
/// Engines may process requests on independent worker threads; the handler
/// they get is `Send + Sync` and the adapter keeps no cross-request state.
pub trait ServerEngine: Sized {
    type Request: NativeRequest;
    type Response: NativeResponse;

    fn bind(config: &ListenConfig) -> io::Result<Self>;

    fn mount(&mut self, handler: EngineHandler<Self>);

    /// Block until shutdown is requested. Any accept/read/write blocking
    /// happens in here, not in the adapter.
    fn run(&mut self) -> io::Result<()>;

    fn shutdown(&mut self);
}
