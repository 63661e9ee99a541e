//! Built-in `svm` host functions.
//!
//! Guests move bulk data across the boundary by register index only. Each
//! function:
//! 1. Extracts memory and HostState from the Caller
//! 2. Validates pointer/length/index arguments
//! 3. Performs the copy or region operation
//! 4. Returns an i32 error code (0 = OK)
//!
//! A failing call never traps and never leaves a register or the paged
//! region partially written.

use wasmtime::{Caller, Linker, Memory};

use bridge_hostapi::{BridgeError, ErrorCode};

use crate::error::SandboxError;
use crate::host_impl::HostState;
use crate::memory;

/// Import namespace of the built-in functions.
pub const SVM_NAMESPACE: &str = "svm";

/// Get the guest's exported memory from a Caller.
fn get_memory<N: ?Sized + 'static>(caller: &mut Caller<'_, HostState<N>>) -> Option<Memory> {
    caller.get_export("memory").and_then(|e| e.into_memory())
}

fn status(result: Result<(), BridgeError>) -> i32 {
    match result {
        Ok(()) => ErrorCode::Ok.as_i32(),
        Err(e) => {
            tracing::trace!(error = %e, "svm host function failed");
            e.to_error_code()
        }
    }
}

/// Register length as the guest's `i32`.
fn guest_len(len: usize) -> Result<i32, BridgeError> {
    i32::try_from(len).map_err(|_| BridgeError::OutOfBounds {
        offset: 0,
        len: len as u64,
        size: i32::MAX as u64,
    })
}

/// Register all `svm` functions with the linker.
pub fn register_svm_functions<N>(linker: &mut Linker<HostState<N>>) -> Result<(), SandboxError>
where
    N: ?Sized + Send + Sync + 'static,
{
    register_register_len(linker)?;
    register_mem_to_reg_copy(linker)?;
    register_reg_to_mem_copy(linker)?;
    register_region_read_to_reg(linker)?;
    register_region_write_from_reg(linker)?;
    register_region_grow(linker)?;
    register_region_pages(linker)?;
    Ok(())
}

// ── Registers ──

fn register_register_len<N>(linker: &mut Linker<HostState<N>>) -> Result<(), SandboxError>
where
    N: ?Sized + Send + Sync + 'static,
{
    linker.func_wrap(
        SVM_NAMESPACE,
        "register_len",
        |mut caller: Caller<'_, HostState<N>>, reg: u32, out_len_ptr: u32| -> i32 {
            let mem = match get_memory(&mut caller) {
                Some(m) => m,
                None => return ErrorCode::Internal.as_i32(),
            };
            let (data, state) = mem.data_and_store_mut(&mut caller);
            status(
                state
                    .registers()
                    .len(reg)
                    .and_then(guest_len)
                    .and_then(|len| memory::write_i32(data, out_len_ptr, len)),
            )
        },
    )?;
    Ok(())
}

fn register_mem_to_reg_copy<N>(linker: &mut Linker<HostState<N>>) -> Result<(), SandboxError>
where
    N: ?Sized + Send + Sync + 'static,
{
    linker.func_wrap(
        SVM_NAMESPACE,
        "mem_to_reg_copy",
        |mut caller: Caller<'_, HostState<N>>, mem_ptr: u32, len: u32, reg: u32| -> i32 {
            let mem = match get_memory(&mut caller) {
                Some(m) => m,
                None => return ErrorCode::Internal.as_i32(),
            };
            let (data, state) = mem.data_and_store_mut(&mut caller);
            status(
                memory::guest_slice(data, mem_ptr, len)
                    .and_then(|bytes| state.registers_mut().set(reg, bytes)),
            )
        },
    )?;
    Ok(())
}

fn register_reg_to_mem_copy<N>(linker: &mut Linker<HostState<N>>) -> Result<(), SandboxError>
where
    N: ?Sized + Send + Sync + 'static,
{
    linker.func_wrap(
        SVM_NAMESPACE,
        "reg_to_mem_copy",
        |mut caller: Caller<'_, HostState<N>>, reg: u32, mem_ptr: u32, capacity: u32| -> i32 {
            let mem = match get_memory(&mut caller) {
                Some(m) => m,
                None => return ErrorCode::Internal.as_i32(),
            };
            let (data, state) = mem.data_and_store_mut(&mut caller);
            let result = memory::validate_range(data.len(), mem_ptr, capacity)
                .and_then(|()| state.registers().get(reg))
                .and_then(|bytes| {
                    if bytes.len() as u64 > capacity as u64 {
                        return Err(BridgeError::OutOfBounds {
                            offset: mem_ptr as u64,
                            len: bytes.len() as u64,
                            size: capacity as u64,
                        });
                    }
                    memory::write_bytes(data, mem_ptr, bytes)
                });
            status(result)
        },
    )?;
    Ok(())
}

// ── Paged memory region ──

fn register_region_read_to_reg<N>(linker: &mut Linker<HostState<N>>) -> Result<(), SandboxError>
where
    N: ?Sized + Send + Sync + 'static,
{
    linker.func_wrap(
        SVM_NAMESPACE,
        "region_read_to_reg",
        |mut caller: Caller<'_, HostState<N>>, offset: u32, len: u32, reg: u32| -> i32 {
            status(
                caller
                    .data_mut()
                    .context
                    .region_to_register(offset as u64, len as u64, reg),
            )
        },
    )?;
    Ok(())
}

fn register_region_write_from_reg<N>(linker: &mut Linker<HostState<N>>) -> Result<(), SandboxError>
where
    N: ?Sized + Send + Sync + 'static,
{
    linker.func_wrap(
        SVM_NAMESPACE,
        "region_write_from_reg",
        |mut caller: Caller<'_, HostState<N>>, reg: u32, offset: u32| -> i32 {
            status(caller.data_mut().context.register_to_region(reg, offset as u64))
        },
    )?;
    Ok(())
}

fn register_region_grow<N>(linker: &mut Linker<HostState<N>>) -> Result<(), SandboxError>
where
    N: ?Sized + Send + Sync + 'static,
{
    linker.func_wrap(
        SVM_NAMESPACE,
        "region_grow",
        |mut caller: Caller<'_, HostState<N>>, additional: u32| -> i64 {
            // New page count, or the negated error code.
            match caller.data_mut().memory_mut().grow(additional) {
                Ok(total) => total as i64,
                Err(e) => -(e.to_error_code() as i64),
            }
        },
    )?;
    Ok(())
}

fn register_region_pages<N>(linker: &mut Linker<HostState<N>>) -> Result<(), SandboxError>
where
    N: ?Sized + Send + Sync + 'static,
{
    linker.func_wrap(
        SVM_NAMESPACE,
        "region_pages",
        // Wasm `i32`, read as unsigned by the guest.
        |caller: Caller<'_, HostState<N>>| -> u32 { caller.data().memory().current_pages() },
    )?;
    Ok(())
}
