//! Guest linear-memory helpers with bounds checking.
//!
//! All functions validate pointer and length arguments against the guest's
//! linear memory size before accessing. Out-of-bounds access returns
//! `BridgeError::OutOfBounds`; nothing is written on failure.

use bridge_hostapi::BridgeError;

fn range(mem_size: usize, ptr: u32, len: u32) -> Result<std::ops::Range<usize>, BridgeError> {
    let start = ptr as usize;
    match start.checked_add(len as usize) {
        Some(end) if end <= mem_size => Ok(start..end),
        _ => Err(BridgeError::OutOfBounds {
            offset: ptr as u64,
            len: len as u64,
            size: mem_size as u64,
        }),
    }
}

/// Borrow `len` bytes of guest memory at `ptr`.
pub fn guest_slice(mem: &[u8], ptr: u32, len: u32) -> Result<&[u8], BridgeError> {
    let r = range(mem.len(), ptr, len)?;
    Ok(&mem[r])
}

/// Copy `len` bytes out of guest memory at `ptr`.
pub fn read_bytes(mem: &[u8], ptr: u32, len: u32) -> Result<Vec<u8>, BridgeError> {
    guest_slice(mem, ptr, len).map(<[u8]>::to_vec)
}

/// Write `data` bytes to guest memory at `ptr`.
pub fn write_bytes(mem: &mut [u8], ptr: u32, data: &[u8]) -> Result<(), BridgeError> {
    let len = u32::try_from(data.len()).map_err(|_| BridgeError::OutOfBounds {
        offset: ptr as u64,
        len: data.len() as u64,
        size: mem.len() as u64,
    })?;
    let r = range(mem.len(), ptr, len)?;
    mem[r].copy_from_slice(data);
    Ok(())
}

/// Write an i32 value (little-endian) to guest memory at `ptr`.
pub fn write_i32(mem: &mut [u8], ptr: u32, value: i32) -> Result<(), BridgeError> {
    write_bytes(mem, ptr, &value.to_le_bytes())
}

/// Validate that a pointer range `[ptr, ptr+len)` is within memory bounds.
pub fn validate_range(mem_size: usize, ptr: u32, len: u32) -> Result<(), BridgeError> {
    range(mem_size, ptr, len).map(|_| ())
}
