//! `bridge-sandbox` — Wasmtime host bridge for guest modules.
//!
//! This crate wires the primitives of `bridge-hostapi` (register bank, paged
//! memory region, instance context) into Wasmtime:
//!
//! - **Import objects:** host function tables plus a fresh instance context,
//!   built per instantiation
//! - **`svm` built-ins:** guests move bulk data by register index only
//! - **Linear ownership:** a failed instantiation hands the import object
//!   back, a successful one moves it into the instance
//! - **Memory limits:** bounded guest linear memory and tables
//! - **Import whitelisting:** only `svm` and host-table namespaces, no WASI
//!
//! The primary entry point is [`Sandbox`].

pub mod error;
pub mod config;
pub mod memory;
pub mod host_impl;
pub mod host_functions;
pub mod validation;
pub mod linker;
pub mod last_error;
pub mod import_object;
pub mod instance;
pub mod runtime;

pub use error::{InstantiateError, SandboxError};
pub use config::SandboxConfig;
pub use host_functions::HostFunction;
pub use host_impl::HostState;
pub use import_object::ImportObject;
pub use instance::Instance;
pub use last_error::LastError;
pub use linker::SVM_NAMESPACE;
pub use runtime::Sandbox;

pub use bridge_hostapi as hostapi;
