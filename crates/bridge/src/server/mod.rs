//! Lifecycle shim around the server engine: resolve the listen options,
//! bind, mount the adapter as the single handler, run until shutdown.
//!
//! Pure glue by design. The one decision it owns is option defaulting: the
//! port falls back to a fixed value, and the bind address falls back to the
//! loopback host when `RACK_ENV` says `development` and stays unset
//! otherwise (production deployments tell the engine where to listen
//! explicitly).
//!
//! [`start`] returns an explicit [`ServerHandle`] instead of parking the
//! engine in process-global state; whoever holds the handle runs and shuts
//! the engine down, once each, from a single controlling thread. There is no
//! concurrency guard around that pair on purpose.

use crate::app::Application;
use crate::bridge::Bridge;
use crate::engine::ServerEngine;
use crate::error::BridgeError;
use std::env;
use std::fmt;
use std::io;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

/// Fallback listen port.
pub const DEFAULT_PORT: u16 = 9292;

const DEVELOPMENT_HOST: &str = "localhost";
const ENV_VAR: &str = "RACK_ENV";

/// The two recognized listen options. Both optional; see [`valid_options`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl ServerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host<H: Into<String>>(mut self, host: H) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Merge with the environment-derived defaults.
    pub fn resolve(&self) -> ListenConfig {
        ListenConfig {
            host: self
                .host
                .clone()
                .or_else(|| default_host(env::var(ENV_VAR).ok().as_deref())),
            port: self.port.unwrap_or(DEFAULT_PORT),
        }
    }
}

fn default_host(rack_env: Option<&str>) -> Option<String> {
    (rack_env == Some("development")).then(|| DEVELOPMENT_HOST.to_owned())
}

/// The resolved listen configuration handed to [`ServerEngine::bind`]. A
/// `None` host leaves the bind address to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenConfig {
    pub host: Option<String>,
    pub port: u16,
}

/// The option-listing surface: recognized option names with their
/// descriptions, for embedding in a launcher's help output.
pub fn valid_options() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Host=HOST", "Hostname to listen on (default: localhost in development)"),
        ("Port=PORT", "Port to listen on (default: 9292)"),
    ]
}

/// Bind an engine, mount `app` behind the adapter, and hand back the handle.
///
/// Does not block; call [`ServerHandle::run`] to serve.
pub fn start<E, A>(app: A, options: ServerOptions) -> Result<ServerHandle<E>, BridgeError>
where
    E: ServerEngine,
    A: Application + 'static,
{
    start_with(app, options, |_engine: &mut E| {})
}

/// Like [`start`], additionally yielding the freshly bound engine to
/// `configure` for engine-specific tweaks before it is handed back.
pub fn start_with<E, A, F>(app: A, options: ServerOptions, configure: F) -> Result<ServerHandle<E>, BridgeError>
where
    E: ServerEngine,
    A: Application + 'static,
    F: FnOnce(&mut E),
{
    let config = options.resolve();
    let mut engine = E::bind(&config).map_err(BridgeError::io)?;
    engine.mount(Bridge::new(app).into_handler::<E>());
    configure(&mut engine);
    Ok(ServerHandle { engine: Some(engine), config })
}

/// Single-owner handle to a bound engine.
pub struct ServerHandle<E: ServerEngine> {
    engine: Option<E>,
    config: ListenConfig,
}

impl<E: ServerEngine> ServerHandle<E> {
    /// Block until the engine shuts down.
    pub fn run(&mut self) -> io::Result<()> {
        let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
        // Keep an already-installed subscriber if the host process set one.
        let _ = tracing::subscriber::set_global_default(subscriber);

        let Some(engine) = self.engine.as_mut() else {
            return Ok(());
        };

        info!(host = ?self.config.host, port = self.config.port, "engine running");
        engine.run()
    }

    /// Request engine shutdown and clear the held engine. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            info!("engine shutdown requested");
            engine.shutdown();
        }
    }

    /// The still-held engine, if not yet shut down.
    pub fn engine_mut(&mut self) -> Option<&mut E> {
        self.engine.as_mut()
    }

    pub fn config(&self) -> &ListenConfig {
        &self.config
    }
}

impl<E: ServerEngine> fmt::Debug for ServerHandle<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerHandle")
            .field("bound", &self.engine.is_some())
            .field("config", &self.config)
            .finish()
    }
}
