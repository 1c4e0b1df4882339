use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the adapter while assembling or delivering a response.
///
/// Request translation never fails; everything that can go wrong lives on the
/// response side or in the engine lifecycle.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The application invoked the full-hijack capability. Only the response
    /// phase can be hijacked here; asking for the raw connection is a
    /// violation of the documented capability contract, not a runtime
    /// condition to recover from.
    #[error("full connection hijack is not supported, only the response phase can be hijacked")]
    FullHijackUnsupported,

    /// The engine rejected a header mutation on its native response object.
    #[error("engine rejected response header {name:?}: {source}")]
    Header { name: String, source: io::Error },

    /// A path-backed body could not be opened for binary read.
    #[error("cannot open file body {path:?}: {source}")]
    OpenFileBody { path: PathBuf, source: io::Error },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl BridgeError {
    pub fn header<S: ToString>(name: S, source: io::Error) -> Self {
        Self::Header { name: name.to_string(), source }
    }

    pub fn open_file_body<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        Self::OpenFileBody { path: path.into(), source }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
