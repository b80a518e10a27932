//! シェーダー関係の操作

use crate::{
    comptrize,
    d3d11::com_support::{ComPtr, HresultErrorExt},
    null,
    pipeline::{Handle, ShaderStage},
    shader::{InputElement, ShaderLibrary},
};

use std::{ffi::c_void, fs::read, path::Path};

use anyhow::{bail, Context, Result};
use log::debug;
use winapi::um::d3d11;

/// Loads a compiled shader object and returns the shader's handle.
///
/// Vertex shader bytecode is kept in `library` for input layout creation.
pub fn load_shader(
    device: &d3d11::ID3D11Device,
    library: &ShaderLibrary,
    filename: impl AsRef<Path>,
    stage: ShaderStage,
) -> Result<Handle> {
    let filename = filename.as_ref();
    let shader_binary = read(filename)
        .with_context(|| format!("Failed to open shader '{}'", filename.display()))?;

    let handle = match stage {
        ShaderStage::Vertex => {
            let shader = unsafe {
                let mut shader = null!(d3d11::ID3D11VertexShader);
                device
                    .CreateVertexShader(
                        shader_binary.as_ptr() as *const c_void,
                        shader_binary.len(),
                        null!(d3d11::ID3D11ClassLinkage),
                        &mut shader as *mut *mut d3d11::ID3D11VertexShader,
                    )
                    .err()
                    .context("Failed to load Vertex Shader")?;
                comptrize!(shader);
                shader
            };
            library.register(Handle::from_ptr(shader.as_ptr()), shader_binary)?;
            shader.into_handle()
        }
        ShaderStage::Fragment => {
            let shader = unsafe {
                let mut shader = null!(d3d11::ID3D11PixelShader);
                device
                    .CreatePixelShader(
                        shader_binary.as_ptr() as *const c_void,
                        shader_binary.len(),
                        null!(d3d11::ID3D11ClassLinkage),
                        &mut shader as *mut *mut d3d11::ID3D11PixelShader,
                    )
                    .err()
                    .context("Failed to load Pixel Shader")?;
                comptrize!(shader);
                shader
            };
            shader.into_handle()
        }
    };

    debug!("Loaded {:?} shader {} from {}", stage, handle, filename.display());
    Ok(handle)
}

/// Releases a shader from [`load_shader`], forgetting its bytecode.
pub fn unload_shader(library: &ShaderLibrary, shader: Handle, stage: ShaderStage) -> Result<()> {
    let shader = match ComPtr::<d3d11::ID3D11DeviceChild>::from_handle(shader) {
        Some(shader) => shader,
        None => bail!("Can not unload null shader."),
    };
    if stage == ShaderStage::Vertex {
        library.unregister(Handle::from_ptr(shader.as_ptr()));
    }
    Ok(())
}

/// Creates an input layout validated against a registered vertex shader.
pub fn create_input_layout(
    device: &d3d11::ID3D11Device,
    library: &ShaderLibrary,
    vertex_shader: Handle,
    elements: &[InputElement],
) -> Result<Handle> {
    if vertex_shader.is_null() {
        bail!("Shader pointer must not be null.");
    }
    let shader_binary = library.blob(vertex_shader)?;

    let descs: Vec<_> = elements
        .iter()
        .map(|element| d3d11::D3D11_INPUT_ELEMENT_DESC {
            SemanticName: element.semantic_name.as_ptr(),
            SemanticIndex: element.semantic_index,
            Format: element.format,
            InputSlot: element.input_slot,
            AlignedByteOffset: d3d11::D3D11_APPEND_ALIGNED_ELEMENT,
            InputSlotClass: if element.per_vertex {
                d3d11::D3D11_INPUT_PER_VERTEX_DATA
            } else {
                d3d11::D3D11_INPUT_PER_INSTANCE_DATA
            },
            InstanceDataStepRate: element.instance_step_rate(),
        })
        .collect();

    let input_layout = unsafe {
        let mut input_layout = null!(d3d11::ID3D11InputLayout);
        device
            .CreateInputLayout(
                descs.as_ptr(),
                descs.len() as u32,
                shader_binary.as_ptr() as *const c_void,
                shader_binary.len(),
                &mut input_layout as *mut *mut d3d11::ID3D11InputLayout,
            )
            .err()
            .context("Failed to create Input Layout")?;
        comptrize!(input_layout);
        input_layout
    };
    Ok(input_layout.into_handle())
}
