//! A running guest module bound to one instance context.

use std::fmt;

use wasmtime::{Memory, Store, WasmParams, WasmResults};

use bridge_hostapi::{InstanceContext, PagedMemory};

use crate::error::SandboxError;
use crate::host_impl::HostState;
use crate::memory;

/// An instantiated module.
///
/// Owns the store, and with it the instance context that the import object
/// built. Dropping the instance releases the registers, the paged region
/// and the guest's linear memory together.
pub struct Instance<N: ?Sized + 'static> {
    store: Store<HostState<N>>,
    instance: wasmtime::Instance,
}

impl<N: ?Sized + 'static> Instance<N> {
    pub(crate) fn new(store: Store<HostState<N>>, instance: wasmtime::Instance) -> Self {
        Self { store, instance }
    }

    /// The host-supplied node data. Never copied or mutated by the sandbox.
    pub fn node_data(&self) -> &N {
        self.store.data().node_data()
    }

    pub fn context(&self) -> &InstanceContext<N> {
        &self.store.data().context
    }

    pub fn context_mut(&mut self) -> &mut InstanceContext<N> {
        &mut self.store.data_mut().context
    }

    pub fn register_get(&self, index: u32) -> Result<&[u8], SandboxError> {
        Ok(self.store.data().registers().get(index)?)
    }

    pub fn register_set(&mut self, index: u32, bytes: &[u8]) -> Result<(), SandboxError> {
        Ok(self.store.data_mut().registers_mut().set(index, bytes)?)
    }

    /// The paged memory region.
    pub fn memory(&self) -> &PagedMemory {
        self.store.data().memory()
    }

    pub fn memory_mut(&mut self) -> &mut PagedMemory {
        self.store.data_mut().memory_mut()
    }

    /// Call the exported function `name`.
    ///
    /// A trap, including one raised by a host function, becomes
    /// `GuestTrapped`; the context stays usable afterwards.
    pub fn call<P, R>(&mut self, name: &str, params: P) -> Result<R, SandboxError>
    where
        P: WasmParams,
        R: WasmResults,
    {
        let func = self
            .instance
            .get_func(&mut self.store, name)
            .ok_or_else(|| SandboxError::MissingExport(name.to_string()))?;
        let typed = func.typed::<P, R>(&self.store)?;
        typed.call(&mut self.store, params).map_err(|e| {
            tracing::debug!(export = name, error = %e, "guest call trapped");
            SandboxError::GuestTrapped(format!("{e:#}"))
        })
    }

    /// Copy `len` bytes out of the guest's linear memory.
    pub fn read_guest_memory(&mut self, ptr: u32, len: u32) -> Result<Vec<u8>, SandboxError> {
        let mem = self.guest_memory()?;
        Ok(memory::read_bytes(mem.data(&self.store), ptr, len)?)
    }

    /// Copy `bytes` into the guest's linear memory at `ptr`.
    pub fn write_guest_memory(&mut self, ptr: u32, bytes: &[u8]) -> Result<(), SandboxError> {
        let mem = self.guest_memory()?;
        Ok(memory::write_bytes(mem.data_mut(&mut self.store), ptr, bytes)?)
    }

    fn guest_memory(&mut self) -> Result<Memory, SandboxError> {
        self.instance
            .get_memory(&mut self.store, "memory")
            .ok_or_else(|| SandboxError::MissingExport("memory".into()))
    }
}

impl<N: ?Sized + 'static> fmt::Debug for Instance<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("context", &self.store.data().context)
            .finish_non_exhaustive()
    }
}
