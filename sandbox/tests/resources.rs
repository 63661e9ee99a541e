//! Resource limit tests — guest memory limits, table limits and import
//! validation.
//!
//! These tests verify that the sandbox correctly enforces resource limits
//! and rejects invalid WASM modules.

mod common;

use bridge_hostapi::NodeData;
use bridge_sandbox::{SandboxConfig, SandboxError};

use common::*;

const GROWING_GUEST: &str = r#"
    (module
        (memory (export "memory") 1)
        (func (export "grow") (param i32) (result i32)
            (memory.grow (local.get 0)))
    )
"#;

fn limited(pages: u32) -> SandboxConfig {
    SandboxConfig {
        max_guest_memory_pages: pages,
        ..SandboxConfig::default()
    }
}

// ── Test: guest linear memory limit ──

#[test]
fn test_guest_memory_growth_capped() {
    let sandbox = sandbox_with_config(limited(2));
    let mut instance = instantiate_svm(&sandbox, GROWING_GUEST, alice(), 0, 1, NodeData::new(()));

    let previous: i32 = instance.call("grow", 1).unwrap();
    assert_eq!(previous, 1);
    let previous: i32 = instance.call("grow", 1).unwrap();
    assert_eq!(previous, -1, "growth beyond the limit must be rejected");
}

#[test]
fn test_initial_memory_above_limit_fails_instantiation() {
    let sandbox = sandbox_with_config(limited(2));
    let module = sandbox
        .compile(br#"(module (memory (export "memory") 4))"#)
        .unwrap();
    let import_object = sandbox
        .build_import_object(alice(), 0, 1, NodeData::new(()), Vec::new())
        .unwrap();

    let err = sandbox.instantiate(&module, import_object).unwrap_err();
    assert!(matches!(err.error, SandboxError::Wasmtime(_)));
    assert!(sandbox.last_error_length() > 0);
}

#[test]
fn test_table_growth_capped() {
    let sandbox = sandbox_with_config(SandboxConfig {
        max_table_elements: 4,
        ..SandboxConfig::default()
    });
    let mut instance = instantiate_svm(
        &sandbox,
        r#"
        (module
            (memory (export "memory") 1)
            (table 1 funcref)
            (func (export "grow") (param i32) (result i32)
                (table.grow (ref.null func) (local.get 0)))
        )
    "#,
        alice(),
        0,
        1,
        NodeData::new(()),
    );

    let previous: i32 = instance.call("grow", 3).unwrap();
    assert_eq!(previous, 1);
    let previous: i32 = instance.call("grow", 1).unwrap();
    assert_eq!(previous, -1);
}

// ── Test: import validation ──

#[test]
fn test_wasi_import_rejected() {
    let sandbox = sandbox();
    let module = sandbox
        .compile(
            br#"
            (module
                (import "wasi_snapshot_preview1" "fd_write"
                    (func (param i32 i32 i32 i32) (result i32)))
                (memory (export "memory") 1)
            )
        "#,
        )
        .unwrap();
    let import_object = sandbox
        .build_import_object(alice(), 0, 1, NodeData::new(()), Vec::new())
        .unwrap();

    let err = sandbox.instantiate(&module, import_object).unwrap_err();
    match err.error {
        SandboxError::ValidationError(msg) => assert!(msg.contains("WASI"), "{}", msg),
        other => panic!("expected ValidationError, got {:?}", other),
    }
}

#[test]
fn test_missing_memory_export_rejected() {
    let sandbox = sandbox();
    let module = sandbox
        .compile(br#"(module (func (export "run")))"#)
        .unwrap();
    let import_object = sandbox
        .build_import_object(alice(), 0, 1, NodeData::new(()), Vec::new())
        .unwrap();

    let err = sandbox.instantiate(&module, import_object).unwrap_err();
    assert!(matches!(err.error, SandboxError::ValidationError(_)));
}

#[test]
fn test_svm_signature_mismatch_fails_link() {
    let sandbox = sandbox();
    let module = sandbox
        .compile(
            br#"
            (module
                (import "svm" "region_pages" (func (param i32) (result i32)))
                (memory (export "memory") 1)
            )
        "#,
        )
        .unwrap();
    let import_object = sandbox
        .build_import_object(alice(), 0, 1, NodeData::new(()), Vec::new())
        .unwrap();

    let err = sandbox.instantiate(&module, import_object).unwrap_err();
    assert!(matches!(err.error, SandboxError::Wasmtime(_)));
}
