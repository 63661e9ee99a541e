//! WASM module validation — import and export checks.
//!
//! Validates that a compiled module can be wired to an import object before
//! instantiation is attempted. Checks:
//!
//! 1. No WASI imports
//! 2. Every import comes from `svm` or a namespace the import object defines
//! 3. Only function imports
//! 4. Memory export present

use std::collections::BTreeSet;

use wasmtime::{ExternType, Module};

use crate::error::SandboxError;
use crate::linker::SVM_NAMESPACE;

/// Validate `module` against the namespaces available in an import object.
pub fn validate_module(module: &Module, namespaces: &BTreeSet<String>) -> Result<(), SandboxError> {
    validate_exports(module)?;
    validate_imports(module, namespaces)?;
    Ok(())
}

/// Check that the module exports its linear memory.
fn validate_exports(module: &Module) -> Result<(), SandboxError> {
    let has_memory = module
        .exports()
        .any(|e| e.name() == "memory" && matches!(e.ty(), ExternType::Memory(_)));
    if !has_memory {
        return Err(SandboxError::ValidationError(
            "module must export 'memory'".into(),
        ));
    }
    Ok(())
}

/// Check that all imports are functions from known namespaces and none are WASI.
fn validate_imports(module: &Module, namespaces: &BTreeSet<String>) -> Result<(), SandboxError> {
    for import in module.imports() {
        let module_name = import.module();

        if module_name.starts_with("wasi") {
            return Err(SandboxError::ValidationError(format!(
                "WASI import not allowed: {}::{}",
                module_name,
                import.name()
            )));
        }

        if module_name != SVM_NAMESPACE && !namespaces.contains(module_name) {
            return Err(SandboxError::ValidationError(format!(
                "import from unknown module '{}': {}",
                module_name,
                import.name()
            )));
        }

        if !matches!(import.ty(), ExternType::Func(_)) {
            return Err(SandboxError::ValidationError(format!(
                "non-function import not allowed: {}::{}",
                module_name,
                import.name()
            )));
        }
    }

    Ok(())
}
