//! Import object builder.
//!
//! An `ImportObject` is everything a module needs before it can be
//! instantiated: the wasmtime store holding a fresh `InstanceContext`, and a
//! linker carrying the `svm` built-ins plus the caller's host function table.
//!
//! Ownership is linear. `instantiate` consumes the import object; on success
//! its store moves into the returned `Instance`, on failure it comes back
//! inside the error, with its registers and region as they were before the
//! attempt, so the caller can retry or drop it.
//!
//! The paged region is host storage reached through the `svm` built-ins. A
//! guest's own `memory.grow` is bounded by
//! `SandboxConfig::max_guest_memory_pages`, not by `max_pages`.

use std::collections::BTreeSet;
use std::fmt;

use wasmtime::{Engine, Linker, Module, Store};

use bridge_hostapi::{Address, InstanceContext, NodeData};

use crate::config::SandboxConfig;
use crate::error::{InstantiateError, SandboxError};
use crate::host_functions::HostFunction;
use crate::host_impl::HostState;
use crate::instance::Instance;
use crate::linker::register_svm_functions;
use crate::validation::validate_module;

/// A not-yet-instantiated bundle of host functions and instance state.
pub struct ImportObject<N: ?Sized + 'static> {
    store: Store<HostState<N>>,
    linker: Linker<HostState<N>>,
    namespaces: BTreeSet<String>,
}

impl<N: ?Sized + Send + Sync + 'static> ImportObject<N> {
    /// Build an import object for one instantiation.
    ///
    /// Fails with `InvalidConfiguration` when `max_page_slices` is zero or
    /// the limits cannot be addressed. No region page is allocated here.
    pub fn build(
        engine: &Engine,
        config: &SandboxConfig,
        address: Address,
        max_pages: u32,
        max_page_slices: u32,
        node_data: NodeData<N>,
        host_functions: Vec<HostFunction<N>>,
    ) -> Result<Self, SandboxError> {
        let limits = config.bridge.page_limits(max_pages, max_page_slices);
        let context = InstanceContext::new(&config.bridge, address, limits, node_data)?;

        let store = new_store(engine, HostState::new(context, config));

        let mut linker = Linker::new(engine);
        register_svm_functions(&mut linker)?;

        let mut namespaces = BTreeSet::new();
        for func in &host_functions {
            func.define(engine, &mut linker)?;
            namespaces.insert(func.namespace().to_string());
        }

        tracing::debug!(
            %address,
            max_pages,
            max_page_slices,
            host_functions = host_functions.len(),
            "built import object"
        );

        Ok(Self {
            store,
            linker,
            namespaces,
        })
    }

    /// Instantiate `module` against this import object.
    ///
    /// The module must come from the engine the import object was built on.
    pub fn instantiate(mut self, module: &Module) -> Result<Instance<N>, InstantiateError<N>> {
        if !Engine::same(self.store.engine(), module.engine()) {
            return Err(self.fail(SandboxError::ValidationError(
                "module was compiled by a different engine".into(),
            )));
        }
        if let Err(error) = validate_module(module, &self.namespaces) {
            return Err(self.fail(error));
        }

        // A start function may write registers or grow the region before it
        // traps; keep copies so a failure can hand back the original state.
        let registers = self.store.data().registers().clone();
        let region = self.store.data().memory().clone();

        match self.linker.instantiate(&mut self.store, module) {
            Ok(instance) => {
                tracing::debug!(address = %self.store.data().context.address(), "instantiated module");
                Ok(Instance::new(self.store, instance))
            }
            Err(e) => {
                // Dropping the old store frees whatever the failed
                // instantiation allocated in it.
                let engine = self.store.engine().clone();
                let mut state = self.store.into_data();
                *state.registers_mut() = registers;
                *state.memory_mut() = region;
                self.store = new_store(&engine, state);
                Err(self.fail(SandboxError::Wasmtime(e)))
            }
        }
    }

    fn fail(self, error: SandboxError) -> InstantiateError<N> {
        tracing::debug!(%error, "instantiation failed, returning import object");
        InstantiateError {
            import_object: self,
            error,
        }
    }

    /// Release the import object without instantiating it.
    pub fn destroy(self) {
        tracing::debug!(
            address = %self.store.data().context.address(),
            region_pages = self.store.data().memory().current_pages(),
            "destroying import object"
        );
    }
}

fn new_store<N>(engine: &Engine, state: HostState<N>) -> Store<HostState<N>>
where
    N: ?Sized + Send + Sync + 'static,
{
    let mut store = Store::new(engine, state);
    store.limiter(|state| state);
    store
}

impl<N: ?Sized + 'static> ImportObject<N> {
    pub fn context(&self) -> &InstanceContext<N> {
        &self.store.data().context
    }

    pub fn context_mut(&mut self) -> &mut InstanceContext<N> {
        &mut self.store.data_mut().context
    }

    /// Namespaces defined by the host function table.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.iter().map(String::as_str)
    }
}

impl<N: ?Sized + 'static> fmt::Debug for ImportObject<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportObject")
            .field("context", &self.store.data().context)
            .field("namespaces", &self.namespaces)
            .finish_non_exhaustive()
    }
}
