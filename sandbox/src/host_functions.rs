//! Host-provided function table.
//!
//! A `HostFunction` is one entry of the table handed to the import-object
//! builder: a namespace/name pair, a wasm signature and a closure. The
//! closure receives the wasmtime `Caller`, through which it reaches the
//! instance's `HostState` (node data, registers, paged memory).

use std::fmt;
use std::sync::Arc;

use wasmtime::{Caller, Engine, FuncType, Linker, Val, ValType};

use bridge_hostapi::BridgeError;

use crate::error::SandboxError;
use crate::host_impl::HostState;
use crate::linker::SVM_NAMESPACE;

type HostFn<N> =
    dyn Fn(Caller<'_, HostState<N>>, &[Val], &mut [Val]) -> anyhow::Result<()> + Send + Sync;

/// One host function made available to guest modules.
pub struct HostFunction<N: ?Sized + 'static> {
    namespace: String,
    name: String,
    params: Vec<ValType>,
    results: Vec<ValType>,
    func: Arc<HostFn<N>>,
}

impl<N: ?Sized + Send + Sync + 'static> HostFunction<N> {
    /// Returning `Err` from `func` traps the calling guest.
    pub fn new<F>(
        namespace: impl Into<String>,
        name: impl Into<String>,
        params: impl IntoIterator<Item = ValType>,
        results: impl IntoIterator<Item = ValType>,
        func: F,
    ) -> Self
    where
        F: Fn(Caller<'_, HostState<N>>, &[Val], &mut [Val]) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            params: params.into_iter().collect(),
            results: results.into_iter().collect(),
            func: Arc::new(func),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Define this function in `linker`.
    pub(crate) fn define(
        &self,
        engine: &Engine,
        linker: &mut Linker<HostState<N>>,
    ) -> Result<(), SandboxError> {
        if self.namespace == SVM_NAMESPACE {
            return Err(BridgeError::invalid_configuration(format!(
                "host function {}::{} uses the reserved '{}' namespace",
                self.namespace, self.name, SVM_NAMESPACE
            ))
            .into());
        }
        let ty = FuncType::new(engine, self.params.iter().cloned(), self.results.iter().cloned());
        let func = Arc::clone(&self.func);
        linker.func_new(&self.namespace, &self.name, ty, move |caller, params, results| {
            func(caller, params, results)
        })?;
        Ok(())
    }
}

impl<N: ?Sized + 'static> Clone for HostFunction<N> {
    fn clone(&self) -> Self {
        Self {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            params: self.params.clone(),
            results: self.results.clone(),
            func: Arc::clone(&self.func),
        }
    }
}

impl<N: ?Sized + 'static> fmt::Debug for HostFunction<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFunction")
            .field("namespace", &self.namespace)
            .field("name", &self.name)
            .field("params", &self.params)
            .field("results", &self.results)
            .finish_non_exhaustive()
    }
}
