//! Sandbox runtime — Wasmtime engine, module loading, and instantiation.
//!
//! The `Sandbox` struct is the main entry point. It owns the engine every
//! module and import object must share, and the last-error channel that
//! records why the most recent operation through it failed.

use std::path::Path;

use wasmtime::{Config, Engine, Module};

use bridge_hostapi::{Address, NodeData};

use crate::config::SandboxConfig;
use crate::error::{InstantiateError, SandboxError};
use crate::host_functions::HostFunction;
use crate::import_object::ImportObject;
use crate::instance::Instance;
use crate::last_error::LastError;

/// The WASM sandbox.
///
/// Compiles modules, builds import objects and instantiates one against the
/// other. A `Sandbox` can be shared between threads; every instance it
/// creates owns its own store and is independent of the others. The last
/// error message is kept per calling thread.
pub struct Sandbox {
    engine: Engine,
    config: SandboxConfig,
    last_error: LastError,
}

impl Sandbox {
    /// Create a sandbox with a deterministic engine.
    ///
    /// Rejects configurations whose region settings are unusable.
    pub fn new(config: SandboxConfig) -> Result<Self, SandboxError> {
        config.bridge.validate()?;
        let engine = create_engine(&config)?;
        Ok(Self {
            engine,
            config,
            last_error: LastError::new(),
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Compile WASM bytecode (or WAT text).
    pub fn compile(&self, wasm_bytes: &[u8]) -> Result<Module, SandboxError> {
        let module = Module::new(&self.engine, wasm_bytes).map_err(SandboxError::from);
        self.record(module)
    }

    /// Compile a `.wasm` or `.wat` file.
    pub fn compile_file(&self, path: &Path) -> Result<Module, SandboxError> {
        let module = Module::from_file(&self.engine, path).map_err(SandboxError::from);
        self.record(module)
    }

    /// Build an import object for one instantiation.
    ///
    /// `max_page_slices` must be at least 1. Region pages are allocated as
    /// the guest grows the region, never up front.
    pub fn build_import_object<N>(
        &self,
        address: Address,
        max_pages: u32,
        max_page_slices: u32,
        node_data: NodeData<N>,
        host_functions: Vec<HostFunction<N>>,
    ) -> Result<ImportObject<N>, SandboxError>
    where
        N: ?Sized + Send + Sync + 'static,
    {
        self.record(ImportObject::build(
            &self.engine,
            &self.config,
            address,
            max_pages,
            max_page_slices,
            node_data,
            host_functions,
        ))
    }

    /// Instantiate `module` against `import_object`.
    ///
    /// On success the import object's state moves into the returned
    /// instance. On failure the import object is returned untouched inside
    /// the error.
    pub fn instantiate<N>(
        &self,
        module: &Module,
        import_object: ImportObject<N>,
    ) -> Result<Instance<N>, InstantiateError<N>>
    where
        N: ?Sized + Send + Sync + 'static,
    {
        let result = import_object.instantiate(module);
        if let Err(e) = &result {
            self.last_error.record(&e.error);
        }
        result
    }

    /// Byte length of the calling thread's last error message, 0 if there is
    /// none.
    pub fn last_error_length(&self) -> usize {
        self.last_error.length()
    }

    /// Copy of the last recorded error message.
    pub fn last_error_message(&self) -> Option<String> {
        self.last_error.message()
    }

    /// Remove and return the last recorded error message.
    pub fn take_last_error(&self) -> Option<String> {
        self.last_error.take()
    }

    fn record<T>(&self, result: Result<T, SandboxError>) -> Result<T, SandboxError> {
        if let Err(e) = &result {
            self.last_error.record(e);
        }
        result
    }
}

impl std::fmt::Debug for Sandbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sandbox")
            .field("config", &self.config)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

/// Create a Wasmtime engine with deterministic configuration.
fn create_engine(config: &SandboxConfig) -> Result<Engine, SandboxError> {
    let mut wasm_config = Config::new();

    // Determinism enforcement
    wasm_config.wasm_threads(false);
    wasm_config.wasm_simd(false);
    wasm_config.wasm_relaxed_simd(false);
    wasm_config.wasm_multi_memory(false);
    wasm_config.cranelift_nan_canonicalization(true);

    // Memory limits
    let max_bytes = config.max_guest_memory_bytes() as u64;
    wasm_config.memory_guaranteed_dense_image_size(max_bytes.min(16 * 1024 * 1024));

    Ok(Engine::new(&wasm_config)?)
}
