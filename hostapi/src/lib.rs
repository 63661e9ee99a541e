//! `bridge-hostapi` — engine-independent primitives of the wasm host bridge.
//!
//! This crate defines the state a host shares with sandboxed guest code:
//!
//! - `RegisterBank` — indexed byte buffers, the only bulk-data channel
//!   between host functions and the guest
//! - `PagedMemory` — page-addressable region with bounded, slice-granular growth
//! - `InstanceContext` — node data, registers and region of one instantiation
//! - `NodeData` — opaque, host-owned state passed through to host functions
//! - `BridgeConfig` / `PageLimits` — build-time shape and limits
//! - `BridgeError` — error taxonomy with guest-facing `ErrorCode` conversion
//!
//! The wasmtime integration lives in `bridge-sandbox`.

pub mod error;
pub mod types;
pub mod register;
pub mod paged_memory;
pub mod node_data;
pub mod context;

// Re-export commonly used types at the crate root.
pub use error::{BridgeError, ErrorCode};
pub use types::{Address, BridgeConfig, PageLimits, ADDRESS_LEN, DEFAULT_PAGE_SIZE, DEFAULT_REGISTER_COUNT, MAX_PAGE_SIZE, MAX_REGISTER_COUNT};
pub use register::RegisterBank;
pub use paged_memory::PagedMemory;
pub use node_data::NodeData;
pub use context::InstanceContext;
