//! Paged memory region with bounded, slice-granular growth.
//!
//! The region is a flat byte address space of `current_pages * page_size`
//! bytes. Backing storage is reserved one slice (`max_page_slices` pages) at
//! a time, so growth commits memory in predictable chunks instead of one
//! large contiguous reservation. Slices are invisible to callers: offsets are
//! always flat.

use crate::error::BridgeError;
use crate::types::{Address, PageLimits};

/// Guest-addressable memory region owned by one instance context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagedMemory {
    limits: PageLimits,
    /// Every slice except the last holds exactly `limits.slice_bytes()` bytes.
    slices: Vec<Vec<u8>>,
    pages: u32,
}

impl PagedMemory {
    /// Create an empty region. No pages are allocated until [`grow`](Self::grow).
    pub fn new(limits: PageLimits) -> Result<Self, BridgeError> {
        limits.validate()?;
        Ok(Self {
            limits,
            slices: Vec::new(),
            pages: 0,
        })
    }

    pub fn limits(&self) -> &PageLimits {
        &self.limits
    }

    pub fn current_pages(&self) -> u32 {
        self.pages
    }

    /// Number of slices currently reserved.
    pub fn slice_count(&self) -> usize {
        self.slices.len()
    }

    /// Addressable size in bytes.
    pub fn size(&self) -> u64 {
        self.pages as u64 * self.limits.page_size as u64
    }

    /// Append `additional` zeroed pages and return the new page count.
    ///
    /// Fails with `CapacityExceeded`, leaving the region untouched, when the
    /// new total would exceed `max_pages` or the host cannot allocate the
    /// added pages. Only the added bytes are allocated, never a whole slice.
    pub fn grow(&mut self, additional: u32) -> Result<u32, BridgeError> {
        let new_total = self
            .pages
            .checked_add(additional)
            .filter(|total| *total <= self.limits.max_pages)
            .ok_or_else(|| {
                tracing::warn!(
                    requested = additional,
                    current = self.pages,
                    max_pages = self.limits.max_pages,
                    "paged memory grow rejected"
                );
                BridgeError::CapacityExceeded {
                    requested: additional,
                    current: self.pages,
                    max_pages: self.limits.max_pages,
                }
            })?;

        let slice_bytes = self.limits.slice_bytes();
        let mut remaining = additional as usize * self.limits.page_size as usize;

        // Reserve everything first; nothing is committed until every
        // allocation has succeeded.
        let tail_take = match self.slices.last() {
            Some(tail) if tail.len() < slice_bytes => remaining.min(slice_bytes - tail.len()),
            _ => 0,
        };
        let tail_reserved = match self.slices.last_mut() {
            Some(tail) if tail_take > 0 => tail.try_reserve_exact(tail_take).is_ok(),
            _ => true,
        };
        if !tail_reserved {
            return Err(self.allocation_failed(additional));
        }
        remaining -= tail_take;

        let mut fresh = Vec::new();
        while remaining > 0 {
            let take = remaining.min(slice_bytes);
            let mut slice = Vec::new();
            slice
                .try_reserve_exact(take)
                .and_then(|()| fresh.try_reserve(1))
                .map_err(|_| self.allocation_failed(additional))?;
            slice.resize(take, 0);
            fresh.push(slice);
            remaining -= take;
        }
        self.slices
            .try_reserve_exact(fresh.len())
            .map_err(|_| self.allocation_failed(additional))?;

        if let Some(tail) = self.slices.last_mut().filter(|_| tail_take > 0) {
            tail.resize(tail.len() + tail_take, 0);
        }
        self.slices.extend(fresh);
        debug_assert!(self.slices.len() as u32 <= self.limits.max_slices());

        self.pages = new_total;
        Ok(new_total)
    }

    /// Copy `len` bytes starting at `offset`.
    pub fn read(&self, offset: u64, len: u64) -> Result<Vec<u8>, BridgeError> {
        let (start, end) = self.check_range(offset, len)?;
        let mut out = Vec::with_capacity(end - start);
        let mut addr = start;
        while addr < end {
            let (slice, within) = self.locate(addr);
            let chunk = &self.slices[slice][within..];
            let take = chunk.len().min(end - addr);
            out.extend_from_slice(&chunk[..take]);
            addr += take;
        }
        Ok(out)
    }

    /// Write `bytes` starting at `offset`. Bounds are checked before any byte
    /// is written.
    pub fn write(&mut self, offset: u64, bytes: &[u8]) -> Result<(), BridgeError> {
        let (start, end) = self.check_range(offset, bytes.len() as u64)?;
        let mut addr = start;
        while addr < end {
            let (slice, within) = self.locate(addr);
            let chunk = &mut self.slices[slice][within..];
            let take = chunk.len().min(end - addr);
            let src = addr - start;
            chunk[..take].copy_from_slice(&bytes[src..src + take]);
            addr += take;
        }
        Ok(())
    }

    /// blake3 commitment to one page, keyed by the owning address.
    pub fn page_hash(&self, address: &Address, page: u32) -> Result<[u8; 32], BridgeError> {
        let page_size = self.limits.page_size as u64;
        let bytes = self.read(page as u64 * page_size, page_size)?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(address.as_bytes());
        hasher.update(&page.to_le_bytes());
        hasher.update(&bytes);
        Ok(*hasher.finalize().as_bytes())
    }

    /// blake3 over the hashes of every page, in page order.
    pub fn digest(&self, address: &Address) -> Result<[u8; 32], BridgeError> {
        let mut hasher = blake3::Hasher::new();
        for page in 0..self.pages {
            hasher.update(&self.page_hash(address, page)?);
        }
        Ok(*hasher.finalize().as_bytes())
    }

    fn allocation_failed(&self, requested: u32) -> BridgeError {
        tracing::warn!(
            requested,
            current = self.pages,
            "paged memory grow rejected: host allocation failed"
        );
        BridgeError::CapacityExceeded {
            requested,
            current: self.pages,
            max_pages: self.limits.max_pages,
        }
    }

    fn check_range(&self, offset: u64, len: u64) -> Result<(usize, usize), BridgeError> {
        let size = self.size();
        match offset.checked_add(len) {
            Some(end) if end <= size => Ok((offset as usize, end as usize)),
            _ => Err(BridgeError::out_of_bounds(offset, len, size)),
        }
    }

    fn locate(&self, addr: usize) -> (usize, usize) {
        let slice_bytes = self.limits.slice_bytes();
        (addr / slice_bytes, addr % slice_bytes)
    }
}
