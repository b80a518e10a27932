//! Direct3D 11 C exports.

use crate::{
    command::RawCommand,
    d3d11::{
        context::{create_deferred_context, immediate_context, release_context},
        shader::{create_input_layout, load_shader, unload_shader},
        ComPtr,
    },
    dispatch,
    error::DispatchError,
    interop::{export, read_interop_string, InteropBool},
    pipeline::{Handle, ShaderStage},
    shader::{input_elements_from_raw, InputElementDesc, ShaderLibrary},
};

use std::{convert::TryFrom, ptr::null_mut};

use anyhow::Result;
use winapi::{shared::dxgi, um::d3d11};

unsafe fn required<'a, T>(pointer: *mut T, what: &str) -> Result<&'a mut T, DispatchError> {
    pointer
        .as_mut()
        .ok_or_else(|| DispatchError::invalid(format!("{} pointer must not be null.", what)))
}

unsafe fn required_shared<'a, T>(pointer: *const T, what: &str) -> Result<&'a T, DispatchError> {
    pointer
        .as_ref()
        .ok_or_else(|| DispatchError::invalid(format!("{} pointer must not be null.", what)))
}

fn shader_stage(value: u32) -> Result<ShaderStage, DispatchError> {
    ShaderStage::try_from(value)
        .map_err(|value| DispatchError::invalid(format!("Unknown shader type: {}.", value)))
}

/// Replays `count` render commands on `context`.
#[no_mangle]
pub unsafe extern "C" fn rcq_flush_instructions(
    failure_reason: *mut u16,
    context: *mut d3d11::ID3D11DeviceContext,
    commands: *const RawCommand,
    count: u32,
) -> InteropBool {
    export("rcq_flush_instructions", failure_reason, || {
        dispatch::flush_raw(context, commands, count)
    })
}

/// Executes the list in `*list_slot` on `context` and releases it.
/// The slot is set to null.
#[no_mangle]
pub unsafe extern "C" fn rcq_execute_command_list(
    failure_reason: *mut u16,
    context: *mut d3d11::ID3D11DeviceContext,
    list_slot: *mut *mut d3d11::ID3D11CommandList,
) -> InteropBool {
    export("rcq_execute_command_list", failure_reason, || {
        let context = required(context, "Device context")?;
        let list_slot = required(list_slot, "Command list slot")?;
        let mut list = ComPtr::new(*list_slot);
        *list_slot = null_mut();
        dispatch::execute_command_list(context, &mut list)
    })
}

#[no_mangle]
pub unsafe extern "C" fn rcq_present_back_buffer(
    failure_reason: *mut u16,
    swap_chain: *mut dxgi::IDXGISwapChain,
) -> InteropBool {
    export("rcq_present_back_buffer", failure_reason, || {
        dispatch::present_back_buffer(swap_chain.as_ref())
    })
}

#[no_mangle]
pub unsafe extern "C" fn rcq_get_immediate_context(
    failure_reason: *mut u16,
    device: *mut d3d11::ID3D11Device,
    out_context: *mut Handle,
) -> InteropBool {
    export("rcq_get_immediate_context", failure_reason, || -> Result<()> {
        let device = required(device, "Device")?;
        let out_context = required(out_context, "Context output")?;
        *out_context = immediate_context(device)?.into_handle();
        Ok(())
    })
}

#[no_mangle]
pub unsafe extern "C" fn rcq_create_deferred_context(
    failure_reason: *mut u16,
    device: *mut d3d11::ID3D11Device,
    out_context: *mut Handle,
) -> InteropBool {
    export("rcq_create_deferred_context", failure_reason, || -> Result<()> {
        let device = required(device, "Device")?;
        let out_context = required(out_context, "Context output")?;
        *out_context = create_deferred_context(device)?.into_handle();
        Ok(())
    })
}

/// Finishes each of `count` deferred contexts and executes their lists on `immediate`.
#[no_mangle]
pub unsafe extern "C" fn rcq_execute_deferred_command_lists(
    failure_reason: *mut u16,
    immediate: *mut d3d11::ID3D11DeviceContext,
    deferred: *const *mut d3d11::ID3D11DeviceContext,
    count: u32,
) -> InteropBool {
    export("rcq_execute_deferred_command_lists", failure_reason, || {
        dispatch::execute_deferred_raw(immediate, deferred, count)
    })
}

#[no_mangle]
pub unsafe extern "C" fn rcq_release_context(
    failure_reason: *mut u16,
    context: Handle,
) -> InteropBool {
    export("rcq_release_context", failure_reason, || {
        release_context(context)
    })
}

/// Loads a compiled shader object. `stage` is 0 for vertex, 1 for pixel shaders.
#[no_mangle]
pub unsafe extern "C" fn rcq_load_shader(
    failure_reason: *mut u16,
    device: *mut d3d11::ID3D11Device,
    library: *const ShaderLibrary,
    path: *const u16,
    stage: u32,
    out_shader: *mut Handle,
) -> InteropBool {
    export("rcq_load_shader", failure_reason, || -> Result<()> {
        let device = required(device, "Device")?;
        let library = required_shared(library, "Shader library")?;
        let path = read_interop_string(path, "Shader path")?;
        let stage = shader_stage(stage)?;
        let out_shader = required(out_shader, "Shader output")?;

        *out_shader = load_shader(device, library, path, stage)?;
        Ok(())
    })
}

#[no_mangle]
pub unsafe extern "C" fn rcq_unload_shader(
    failure_reason: *mut u16,
    library: *const ShaderLibrary,
    shader: Handle,
    stage: u32,
) -> InteropBool {
    export("rcq_unload_shader", failure_reason, || -> Result<()> {
        let library = required_shared(library, "Shader library")?;
        unload_shader(library, shader, shader_stage(stage)?)
    })
}

#[no_mangle]
pub unsafe extern "C" fn rcq_create_input_layout(
    failure_reason: *mut u16,
    device: *mut d3d11::ID3D11Device,
    library: *const ShaderLibrary,
    vertex_shader: Handle,
    descs: *const InputElementDesc,
    count: u32,
    out_layout: *mut Handle,
) -> InteropBool {
    export("rcq_create_input_layout", failure_reason, || -> Result<()> {
        let device = required(device, "Device")?;
        let library = required_shared(library, "Shader library")?;
        let elements = input_elements_from_raw(descs, count)?;
        let out_layout = required(out_layout, "Input layout output")?;

        *out_layout = create_input_layout(device, library, vertex_shader, &elements)?;
        Ok(())
    })
}
