//! Per-instance state bundle reachable from every host function.
//!
//! `InstanceContext` combines the node-data handle, the register bank and the
//! paged memory region of one guest instantiation. It is created exactly once
//! per instantiation and dropped with the instance.

use std::fmt;

use crate::error::BridgeError;
use crate::node_data::NodeData;
use crate::paged_memory::PagedMemory;
use crate::register::RegisterBank;
use crate::types::{Address, BridgeConfig, PageLimits};

/// State of one guest instantiation.
pub struct InstanceContext<N: ?Sized> {
    address: Address,
    node_data: NodeData<N>,
    registers: RegisterBank,
    memory: PagedMemory,
}

impl<N: ?Sized> InstanceContext<N> {
    /// Create a context with an empty register bank and an empty region.
    ///
    /// Region pages are allocated lazily by `grow`, never up front.
    pub fn new(
        config: &BridgeConfig,
        address: Address,
        limits: PageLimits,
        node_data: NodeData<N>,
    ) -> Result<Self, BridgeError> {
        config.validate()?;
        Ok(Self {
            address,
            node_data,
            registers: RegisterBank::new(config.register_count),
            memory: PagedMemory::new(limits)?,
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn node_data(&self) -> &N {
        self.node_data.get()
    }

    /// The node-data handle itself, for host functions that need to keep it.
    pub fn node_data_handle(&self) -> &NodeData<N> {
        &self.node_data
    }

    pub fn registers(&self) -> &RegisterBank {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut RegisterBank {
        &mut self.registers
    }

    pub fn memory(&self) -> &PagedMemory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut PagedMemory {
        &mut self.memory
    }

    /// Copy `len` region bytes at `offset` into register `reg`.
    ///
    /// The register is only written once the read has succeeded.
    pub fn region_to_register(&mut self, offset: u64, len: u64, reg: u32) -> Result<(), BridgeError> {
        self.registers.get(reg)?;
        let bytes = self.memory.read(offset, len)?;
        self.registers.set(reg, &bytes)
    }

    /// Copy register `reg` into the region at `offset`.
    pub fn register_to_region(&mut self, reg: u32, offset: u64) -> Result<(), BridgeError> {
        let bytes = self.registers.get(reg)?;
        self.memory.write(offset, bytes)
    }

    /// Digest of the region, keyed by the owning address.
    pub fn memory_digest(&self) -> Result<[u8; 32], BridgeError> {
        self.memory.digest(&self.address)
    }
}

impl<N: ?Sized> fmt::Debug for InstanceContext<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceContext")
            .field("address", &self.address)
            .field("node_data", &self.node_data)
            .field("registers", &self.registers.count())
            .field("pages", &self.memory.current_pages())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_context() -> InstanceContext<&'static str> {
        let config = BridgeConfig {
            register_count: 2,
            page_size: 8,
        };
        InstanceContext::new(
            &config,
            Address([0xAB; 20]),
            config.page_limits(4, 2),
            NodeData::new("node"),
        )
        .unwrap()
    }

    #[test]
    fn test_accessors() {
        let ctx = test_context();
        assert_eq!(*ctx.node_data(), "node");
        assert_eq!(ctx.address(), &Address([0xAB; 20]));
        assert_eq!(ctx.registers().count(), 2);
        assert_eq!(ctx.memory().current_pages(), 0);
        assert_eq!(ctx.memory().limits().page_size, 8);
    }

    #[test]
    fn test_invalid_limits_rejected() {
        let err = InstanceContext::new(
            &BridgeConfig::default(),
            Address::default(),
            PageLimits::new(4, 0),
            NodeData::new(()),
        )
        .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_region_register_transfer() {
        let mut ctx = test_context();
        ctx.memory_mut().grow(2).unwrap();
        ctx.registers_mut().set(0, b"payload").unwrap();

        ctx.register_to_region(0, 5).unwrap();
        ctx.region_to_register(5, 7, 1).unwrap();
        assert_eq!(ctx.registers().get(1).unwrap(), b"payload");
    }

    #[test]
    fn test_failed_region_read_keeps_register() {
        let mut ctx = test_context();
        ctx.memory_mut().grow(1).unwrap();
        ctx.registers_mut().set(1, b"old").unwrap();

        let err = ctx.region_to_register(4, 8, 1).unwrap_err();
        assert!(matches!(err, BridgeError::OutOfBounds { .. }));
        assert_eq!(ctx.registers().get(1).unwrap(), b"old");

        let err = ctx.region_to_register(0, 1, 7).unwrap_err();
        assert!(matches!(err, BridgeError::OutOfRange { .. }));
    }

    #[test]
    fn test_register_to_region_out_of_bounds() {
        let mut ctx = test_context();
        ctx.memory_mut().grow(1).unwrap();
        ctx.registers_mut().set(0, &[1; 9]).unwrap();
        assert!(ctx.register_to_region(0, 0).is_err());
        assert_eq!(ctx.memory().read(0, 8).unwrap(), vec![0; 8]);
    }

    #[test]
    fn test_memory_digest_is_deterministic() {
        let mut a = test_context();
        let mut b = test_context();
        a.memory_mut().grow(1).unwrap();
        b.memory_mut().grow(1).unwrap();
        assert_eq!(a.memory_digest().unwrap(), b.memory_digest().unwrap());
    }
}
