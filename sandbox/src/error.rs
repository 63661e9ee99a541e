//! Sandbox error types.

use std::fmt;

use bridge_hostapi::BridgeError;

use crate::import_object::ImportObject;

/// Top-level error type for the sandbox crate.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// Wasmtime engine, compilation, linking or instantiation error.
    #[error("wasmtime error: {0}")]
    Wasmtime(#[from] anyhow::Error),

    /// Module validation failed (bad imports, missing memory export, etc.).
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Register, region or configuration error from the bridge primitives.
    #[error("bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// Requested export does not exist or is not a function.
    #[error("missing export: {0}")]
    MissingExport(String),

    /// WASM guest trapped.
    #[error("guest trapped: {0}")]
    GuestTrapped(String),
}

/// Failed instantiation.
///
/// Hands the import object back untouched so the caller can retry with
/// another module or release it.
pub struct InstantiateError<N: ?Sized + 'static> {
    pub import_object: ImportObject<N>,
    pub error: SandboxError,
}

impl<N: ?Sized + 'static> InstantiateError<N> {
    pub fn into_parts(self) -> (ImportObject<N>, SandboxError) {
        (self.import_object, self.error)
    }
}

impl<N: ?Sized + 'static> fmt::Debug for InstantiateError<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstantiateError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<N: ?Sized + 'static> fmt::Display for InstantiateError<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instantiation failed: {}", self.error)
    }
}

impl<N: ?Sized + 'static> std::error::Error for InstantiateError<N> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
