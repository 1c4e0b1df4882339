//! A Rack-style adapter between a generic HTTP server engine and an
//! application invoked through the standardized calling convention:
//! normalized environment in, `(status, headers, body)` triple out.
//!
//! The engine — accept loop, keep-alive, TLS, header parsing — stays a black
//! box behind the [`engine`] traits. The adapter owns the translation in
//! both directions:
//!
//! - [`environ`]: the engine's native request object becomes the normalized
//!   [`Environment`](environ::Environment) mapping (metadata copy, required-key
//!   defaults, path computation, hijack capability flags)
//! - [`response`]: the application's triple becomes mutations on the engine's
//!   native response object, plus one of three body delivery strategies —
//!   full response-phase hijack, zero-copy file streaming, or chunk-by-chunk
//!   iteration — and the transfer-encoding override that lets the
//!   application take HTTP chunk framing away from the engine's preamble
//!
//! # Example
//!
//! ```
//! use micro_bridge::app::body::ChunkedBody;
//! use micro_bridge::app::ResponseTriple;
//! use micro_bridge::engine::NativeRequest;
//! use micro_bridge::environ::{key, Environment};
//! use std::io::Read;
//!
//! // The application: environment in, triple out.
//! fn app(env: Environment) -> ResponseTriple {
//!     let path = env.str_var(key::REQUEST_PATH).unwrap_or("/").to_owned();
//!     ResponseTriple::new(200)
//!         .header("content-type", "text/plain")
//!         .body(ChunkedBody::from(format!("you asked for {path}\n")))
//! }
//!
//! // An engine-native request, as the engine traits present it.
//! struct EngineRequest;
//!
//! impl NativeRequest for EngineRequest {
//!     fn meta_vars(&self) -> Vec<(String, Option<String>)> {
//!         vec![
//!             ("SERVER_PROTOCOL".into(), Some("HTTP/1.1".into())),
//!             ("SCRIPT_NAME".into(), Some("".into())),
//!         ]
//!     }
//!
//!     fn uri_path(&self) -> &str {
//!         "/hello"
//!     }
//!
//!     fn take_body(&mut self) -> Box<dyn Read + Send> {
//!         Box::new(std::io::empty())
//!     }
//! }
//!
//! let env = Environment::from_request(&mut EngineRequest);
//! assert_eq!(env.str_var(key::REQUEST_PATH), Some("/hello"));
//!
//! let triple = app(env);
//! assert_eq!(triple.status, 200);
//! ```
//!
//! # Architecture
//!
//! Leaf-first:
//!
//! - [`app`]: the application contract — [`Application`], the triple, the
//!   body shapes
//! - [`environ`]: the normalized environment and request translation
//! - [`response`]: response assembly and the three delivery strategies
//! - [`engine`]: the traits the black-box engine implements
//! - [`bridge`]: per-request glue, mounted as the engine's single handler
//! - [`server`]: the start/shutdown lifecycle shim and listen options
//!
//! Control flow per request: engine → [`Environment::from_request`] →
//! application → triple → [`response::assemble`] →
//! [`response::deliver`] → engine writes bytes to the socket.
//!
//! [`Environment::from_request`]: environ::Environment::from_request
//!
//! # Concurrency
//!
//! The adapter holds no cross-request shared mutable state; the environment
//! and the triple are request-local, and a [`Bridge`] clone is cheap to
//! share across the engine's worker threads. All adapter operations are
//! synchronous — blocking lives in the engine's I/O layer and in the
//! application.

pub mod app;
pub mod bridge;
pub mod engine;
pub mod environ;
pub mod error;
pub mod response;
pub mod server;

pub use crate::app::{Application, HeaderValue, HijackHandler, ResponseTriple};
pub use crate::bridge::Bridge;
pub use crate::error::BridgeError;
pub use crate::response::{WriteOptions, assemble, deliver};
pub use crate::server::{ServerHandle, ServerOptions, start, start_with};
