//! Per-instance state held in the Wasmtime Store.
//!
//! `HostState` wraps the bridge's `InstanceContext` together with the guest
//! resource limits. It lives inside `Store<HostState<N>>` from import-object
//! construction until the instance is dropped, and is what every host
//! function reaches through its `Caller`.

use wasmtime::ResourceLimiter;

use bridge_hostapi::{InstanceContext, NodeData, PagedMemory, RegisterBank};

use crate::config::SandboxConfig;

/// Store data for one guest instantiation.
pub struct HostState<N: ?Sized> {
    /// Node data, registers and paged memory region.
    pub context: InstanceContext<N>,
    max_memory_bytes: usize,
    max_table_elements: usize,
}

impl<N: ?Sized> HostState<N> {
    pub fn new(context: InstanceContext<N>, config: &SandboxConfig) -> Self {
        Self {
            context,
            max_memory_bytes: config.max_guest_memory_bytes(),
            max_table_elements: config.max_table_elements,
        }
    }

    pub fn node_data(&self) -> &N {
        self.context.node_data()
    }

    pub fn node_data_handle(&self) -> &NodeData<N> {
        self.context.node_data_handle()
    }

    pub fn registers(&self) -> &RegisterBank {
        self.context.registers()
    }

    pub fn registers_mut(&mut self) -> &mut RegisterBank {
        self.context.registers_mut()
    }

    pub fn memory(&self) -> &PagedMemory {
        self.context.memory()
    }

    pub fn memory_mut(&mut self) -> &mut PagedMemory {
        self.context.memory_mut()
    }
}

impl<N: ?Sized> ResourceLimiter for HostState<N> {
    fn memory_growing(
        &mut self,
        current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> anyhow::Result<bool> {
        if desired > self.max_memory_bytes {
            tracing::warn!(
                current_bytes = current,
                desired_bytes = desired,
                limit_bytes = self.max_memory_bytes,
                "guest memory grow rejected: exceeds limit"
            );
            return Ok(false);
        }
        Ok(true)
    }

    fn table_growing(
        &mut self,
        _current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> anyhow::Result<bool> {
        Ok(desired <= self.max_table_elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_hostapi::{Address, BridgeConfig, PageLimits};

    fn test_host_state(config: &SandboxConfig) -> HostState<u64> {
        let context = InstanceContext::new(
            &config.bridge,
            Address::default(),
            PageLimits::new(4, 2),
            NodeData::new(7),
        )
        .unwrap();
        HostState::new(context, config)
    }

    #[test]
    fn test_accessors_reach_context() {
        let mut state = test_host_state(&SandboxConfig::default());
        assert_eq!(*state.node_data(), 7);
        state.registers_mut().set(0, b"abc").unwrap();
        assert_eq!(state.registers().get(0).unwrap(), b"abc");
        state.memory_mut().grow(1).unwrap();
        assert_eq!(state.memory().current_pages(), 1);
    }

    #[test]
    fn test_memory_limit() {
        let config = SandboxConfig {
            max_guest_memory_pages: 2,
            bridge: BridgeConfig::default(),
            ..SandboxConfig::default()
        };
        let mut state = test_host_state(&config);
        assert!(state.memory_growing(0, 2 * 65536, None).unwrap());
        assert!(!state.memory_growing(2 * 65536, 3 * 65536, None).unwrap());
    }

    #[test]
    fn test_table_limit() {
        let config = SandboxConfig {
            max_table_elements: 10,
            ..SandboxConfig::default()
        };
        let mut state = test_host_state(&config);
        assert!(state.table_growing(0, 10, None).unwrap());
        assert!(!state.table_growing(10, 11, None).unwrap());
    }
}
