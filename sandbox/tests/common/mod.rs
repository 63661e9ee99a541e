//! Shared test helpers for integration tests.
//!
//! Provides the inline WAT guests, stable addresses and sandbox factory
//! functions used across all integration test files.

#![allow(dead_code)]

use bridge_hostapi::{Address, BridgeConfig, ErrorCode, NodeData};
use bridge_sandbox::{HostFunction, Instance, Sandbox, SandboxConfig};

/// Guest exposing every `svm` built-in through a thin export.
pub const SVM_GUEST: &str = r#"
    (module
        (import "svm" "register_len" (func $register_len (param i32 i32) (result i32)))
        (import "svm" "mem_to_reg_copy" (func $mem_to_reg (param i32 i32 i32) (result i32)))
        (import "svm" "reg_to_mem_copy" (func $reg_to_mem (param i32 i32 i32) (result i32)))
        (import "svm" "region_read_to_reg" (func $region_read (param i32 i32 i32) (result i32)))
        (import "svm" "region_write_from_reg" (func $region_write (param i32 i32) (result i32)))
        (import "svm" "region_grow" (func $region_grow (param i32) (result i64)))
        (import "svm" "region_pages" (func $region_pages (result i32)))
        (memory (export "memory") 1)

        (func (export "reg_len") (param i32 i32) (result i32)
            (call $register_len (local.get 0) (local.get 1)))
        (func (export "store_reg") (param i32 i32 i32) (result i32)
            (call $mem_to_reg (local.get 0) (local.get 1) (local.get 2)))
        (func (export "load_reg") (param i32 i32 i32) (result i32)
            (call $reg_to_mem (local.get 0) (local.get 1) (local.get 2)))
        (func (export "region_read") (param i32 i32 i32) (result i32)
            (call $region_read (local.get 0) (local.get 1) (local.get 2)))
        (func (export "region_write") (param i32 i32) (result i32)
            (call $region_write (local.get 0) (local.get 1)))
        (func (export "region_grow") (param i32) (result i64)
            (call $region_grow (local.get 0)))
        (func (export "region_pages") (result i32)
            (call $region_pages))
    )
"#;

/// Smallest module the sandbox accepts.
pub const MINIMAL_GUEST: &str = r#"(module (memory (export "memory") 1))"#;

/// Status code the `svm` built-ins return for `code`.
pub fn status(code: ErrorCode) -> i32 {
    code.as_i32()
}

// ── Addresses ──

/// Deterministic address filled with `byte`.
pub fn address(byte: u8) -> Address {
    Address::from([byte; 20])
}

pub fn alice() -> Address {
    address(0xA1)
}

pub fn bob() -> Address {
    address(0xB0)
}

// ── Sandbox Factories ──

pub fn sandbox() -> Sandbox {
    Sandbox::new(SandboxConfig::default()).unwrap()
}

pub fn sandbox_with_config(config: SandboxConfig) -> Sandbox {
    Sandbox::new(config).unwrap()
}

/// Sandbox whose instances carry `register_count` registers.
pub fn sandbox_with_registers(register_count: u32) -> Sandbox {
    sandbox_with_config(SandboxConfig {
        bridge: BridgeConfig {
            register_count,
            ..BridgeConfig::default()
        },
        ..SandboxConfig::default()
    })
}

/// Compile `wat` and instantiate it with no host functions beyond `svm`.
pub fn instantiate_svm<N>(
    sandbox: &Sandbox,
    wat: &str,
    address: Address,
    max_pages: u32,
    max_page_slices: u32,
    node_data: NodeData<N>,
) -> Instance<N>
where
    N: Send + Sync + 'static,
{
    instantiate_with(sandbox, wat, address, max_pages, max_page_slices, node_data, Vec::new())
}

/// Compile `wat` and instantiate it against the given host function table.
pub fn instantiate_with<N>(
    sandbox: &Sandbox,
    wat: &str,
    address: Address,
    max_pages: u32,
    max_page_slices: u32,
    node_data: NodeData<N>,
    host_functions: Vec<HostFunction<N>>,
) -> Instance<N>
where
    N: Send + Sync + 'static,
{
    let module = sandbox.compile(wat.as_bytes()).unwrap();
    let import_object = sandbox
        .build_import_object(address, max_pages, max_page_slices, node_data, host_functions)
        .unwrap();
    sandbox.instantiate(&module, import_object).unwrap()
}
