//! Configuration types for the host bridge.
//!
//! `BridgeConfig` carries the build-time shape of every instance context
//! (register count, page size). `PageLimits` bounds a single paged memory
//! region. `Address` identifies the account that owns a region.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

/// Number of registers in a bank unless configured otherwise.
pub const DEFAULT_REGISTER_COUNT: u32 = 16;

/// Byte size of one region page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 4096;

/// Upper bound on `register_count`. Every register is allocated up front.
pub const MAX_REGISTER_COUNT: u32 = 1024;

/// Upper bound on `page_size`, one wasm page.
pub const MAX_PAGE_SIZE: u32 = 65536;

/// Length of an [`Address`] in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Build-time shape of an instance context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Number of registers allocated per instance.
    pub register_count: u32,
    /// Byte size of one paged-memory page.
    pub page_size: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            register_count: DEFAULT_REGISTER_COUNT,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl BridgeConfig {
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.register_count == 0 {
            return Err(BridgeError::invalid_configuration(
                "register_count must be at least 1",
            ));
        }
        if self.register_count > MAX_REGISTER_COUNT {
            return Err(BridgeError::invalid_configuration(format!(
                "register_count {} exceeds {}",
                self.register_count, MAX_REGISTER_COUNT
            )));
        }
        check_page_size(self.page_size)
    }

    /// Page limits for a region built with this config.
    pub fn page_limits(&self, max_pages: u32, max_page_slices: u32) -> PageLimits {
        PageLimits {
            max_pages,
            max_page_slices,
            page_size: self.page_size,
        }
    }
}

/// Limits of one paged memory region.
///
/// `max_page_slices` is the number of pages grouped into one slice, the
/// granularity in which backing storage is reserved. It does not change
/// the flat addressing seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLimits {
    pub max_pages: u32,
    pub max_page_slices: u32,
    pub page_size: u32,
}

impl PageLimits {
    pub fn new(max_pages: u32, max_page_slices: u32) -> Self {
        Self {
            max_pages,
            max_page_slices,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.max_page_slices == 0 {
            return Err(BridgeError::invalid_configuration(
                "max_page_slices must be at least 1",
            ));
        }
        check_page_size(self.page_size)?;
        let max_bytes = self.max_pages as u64 * self.page_size as u64;
        if usize::try_from(max_bytes).is_err() {
            return Err(BridgeError::invalid_configuration(format!(
                "{} pages of {} bytes exceed the host address space",
                self.max_pages, self.page_size
            )));
        }
        Ok(())
    }

    /// Bytes held by one full slice.
    pub fn slice_bytes(&self) -> usize {
        self.max_page_slices as usize * self.page_size as usize
    }

    /// Upper bound on the number of slices a region with these limits can hold.
    pub fn max_slices(&self) -> u32 {
        self.max_pages.div_ceil(self.max_page_slices)
    }
}

fn check_page_size(page_size: u32) -> Result<(), BridgeError> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(BridgeError::invalid_configuration(format!(
            "page_size must be between 1 and {} bytes, got {}",
            MAX_PAGE_SIZE, page_size
        )));
    }
    Ok(())
}

/// Owner address of a paged memory region.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = BridgeError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; ADDRESS_LEN] = bytes.try_into().map_err(|_| {
            BridgeError::invalid_configuration(format!(
                "address must be {} bytes, got {}",
                ADDRESS_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}
