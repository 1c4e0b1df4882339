//! Per-request glue: translate, call, assemble.
//!
//! One [`Bridge`] is mounted as the engine's single handler and shared
//! across whatever worker threads the engine runs. It holds no cross-request
//! state: every invocation builds its own environment and consumes its own
//! triple.

use crate::app::Application;
use crate::engine::{EngineHandler, NativeRequest, NativeResponse, ServerEngine};
use crate::environ::Environment;
use crate::error::BridgeError;
use crate::response::{WriteOptions, assemble};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

/// The adapter for one application.
pub struct Bridge<A: ?Sized> {
    app: Arc<A>,
}

impl<A: Application> Bridge<A> {
    pub fn new(app: A) -> Self {
        Self { app: Arc::new(app) }
    }

    /// Process one request end to end, up to (but not including) the write
    /// phase. Returns the [`WriteOptions`] the engine must pass into
    /// [`deliver`](crate::response::deliver).
    pub fn handle<Req, Res>(&self, req: &mut Req, res: &mut Res) -> Result<WriteOptions, BridgeError>
    where
        Req: NativeRequest + ?Sized,
        Res: NativeResponse + ?Sized,
    {
        let env = Environment::from_request(req);
        let triple = self.app.call(env);
        debug!(status = triple.status, "application returned");

        assemble(triple, res).inspect_err(|e| {
            error!(cause = %e, "response assembly failed");
        })
    }

    /// Box this bridge up as the engine's mounted handler.
    pub fn into_handler<E>(self) -> EngineHandler<E>
    where
        E: ServerEngine,
        A: 'static,
    {
        Box::new(move |req, res| self.handle(req, res))
    }
}

impl<A: ?Sized> Clone for Bridge<A> {
    fn clone(&self) -> Self {
        Self { app: Arc::clone(&self.app) }
    }
}

impl<A: ?Sized> fmt::Debug for Bridge<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge").finish_non_exhaustive()
    }
}
