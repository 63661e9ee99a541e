//! Sandbox configuration.

use serde::{Deserialize, Serialize};

use bridge_hostapi::BridgeConfig;

/// Byte size of one wasm linear-memory page.
pub const WASM_PAGE_SIZE: usize = 65536;

/// Configuration for the WASM sandbox.
///
/// Controls guest linear-memory limits and the shape of every instance
/// context built by the sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Maximum guest linear memory pages (1 page = 64 KiB).
    /// Default: 256 pages = 16 MiB.
    pub max_guest_memory_pages: u32,

    /// Maximum elements in any guest table.
    pub max_table_elements: usize,

    /// Register count and region page size.
    pub bridge: BridgeConfig,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            max_guest_memory_pages: 256, // 16 MiB
            max_table_elements: 10_000,
            bridge: BridgeConfig::default(),
        }
    }
}

impl SandboxConfig {
    pub fn max_guest_memory_bytes(&self) -> usize {
        self.max_guest_memory_pages as usize * WASM_PAGE_SIZE
    }
}
