//! Direct3D 11 device contexts as command replay targets.

use crate::{
    comptrize,
    d3d11::com_support::{ComPtr, HresultErrorExt},
    null,
    pipeline::{
        DepthStencilClear, Handle, IndexFormat, Pipeline, PrimitiveTopology, ScissorRect,
        ShaderStage, SwapChain, Viewport,
    },
};

use std::{mem::zeroed, ptr::copy_nonoverlapping};

use anyhow::{bail, Context as AnyhowContext, Result};
use log::debug;
use winapi::{
    shared::{dxgi, dxgiformat, minwindef::FALSE},
    um::d3d11,
};

/// Blend factor the API uses when none is given.
const DEFAULT_BLEND_FACTOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Reinterprets a handle array as a COM pointer array.
fn com_array<T>(handles: &[Handle]) -> *const *mut T {
    handles.as_ptr() as *const *mut T
}

impl SwapChain for dxgi::IDXGISwapChain {
    fn present(&self, sync_interval: u32, flags: u32) -> Result<()> {
        unsafe { self.Present(sync_interval, flags) }
            .err()
            .context("Failed to present")
    }
}

impl Pipeline for d3d11::ID3D11DeviceContext {
    type CommandList = ComPtr<d3d11::ID3D11CommandList>;
    type SwapChain = dxgi::IDXGISwapChain;

    fn set_primitive_topology(&mut self, topology: PrimitiveTopology) -> Result<()> {
        unsafe {
            self.IASetPrimitiveTopology(topology as u32);
        }
        Ok(())
    }

    fn set_input_layout(&mut self, layout: Handle) -> Result<()> {
        unsafe {
            self.IASetInputLayout(layout.as_ptr());
        }
        Ok(())
    }

    fn set_vertex_buffers(
        &mut self,
        start_slot: u32,
        buffers: &[Handle],
        strides: &[u32],
        offsets: &[u32],
    ) -> Result<()> {
        unsafe {
            self.IASetVertexBuffers(
                start_slot,
                buffers.len() as u32,
                com_array(buffers),
                strides.as_ptr(),
                offsets.as_ptr(),
            );
        }
        Ok(())
    }

    fn set_index_buffer(&mut self, buffer: Handle, format: IndexFormat, offset: u32) -> Result<()> {
        let format = match format {
            IndexFormat::U16 => dxgiformat::DXGI_FORMAT_R16_UINT,
            IndexFormat::U32 => dxgiformat::DXGI_FORMAT_R32_UINT,
        };
        unsafe {
            self.IASetIndexBuffer(buffer.as_ptr(), format, offset);
        }
        Ok(())
    }

    fn set_render_targets(&mut self, render_targets: &[Handle], depth_stencil: Handle) -> Result<()> {
        unsafe {
            self.OMSetRenderTargets(
                render_targets.len() as u32,
                com_array(render_targets),
                depth_stencil.as_ptr(),
            );
        }
        Ok(())
    }

    fn write_discard(&mut self, buffer: Handle, data: &[u8]) -> Result<()> {
        let resource = buffer.as_ptr::<d3d11::ID3D11Resource>();
        unsafe {
            let mut mapped: d3d11::D3D11_MAPPED_SUBRESOURCE = zeroed();
            self.Map(resource, 0, d3d11::D3D11_MAP_WRITE_DISCARD, 0, &mut mapped)
                .err()
                .context("Failed to map buffer")?;
            copy_nonoverlapping(data.as_ptr(), mapped.pData as *mut u8, data.len());
            self.Unmap(resource, 0);
        }
        Ok(())
    }

    fn set_constant_buffers(
        &mut self,
        stage: ShaderStage,
        start_slot: u32,
        buffers: &[Handle],
    ) -> Result<()> {
        let count = buffers.len() as u32;
        unsafe {
            match stage {
                ShaderStage::Vertex => {
                    self.VSSetConstantBuffers(start_slot, count, com_array(buffers))
                }
                ShaderStage::Fragment => {
                    self.PSSetConstantBuffers(start_slot, count, com_array(buffers))
                }
            }
        }
        Ok(())
    }

    fn set_samplers(&mut self, stage: ShaderStage, start_slot: u32, samplers: &[Handle]) -> Result<()> {
        let count = samplers.len() as u32;
        unsafe {
            match stage {
                ShaderStage::Vertex => self.VSSetSamplers(start_slot, count, com_array(samplers)),
                ShaderStage::Fragment => self.PSSetSamplers(start_slot, count, com_array(samplers)),
            }
        }
        Ok(())
    }

    fn set_shader_resources(
        &mut self,
        stage: ShaderStage,
        start_slot: u32,
        views: &[Handle],
    ) -> Result<()> {
        let count = views.len() as u32;
        unsafe {
            match stage {
                ShaderStage::Vertex => {
                    self.VSSetShaderResources(start_slot, count, com_array(views))
                }
                ShaderStage::Fragment => {
                    self.PSSetShaderResources(start_slot, count, com_array(views))
                }
            }
        }
        Ok(())
    }

    fn set_shader(&mut self, stage: ShaderStage, shader: Handle) -> Result<()> {
        unsafe {
            match stage {
                ShaderStage::Vertex => self.VSSetShader(
                    shader.as_ptr(),
                    &null!(d3d11::ID3D11ClassInstance),
                    0,
                ),
                ShaderStage::Fragment => self.PSSetShader(
                    shader.as_ptr(),
                    &null!(d3d11::ID3D11ClassInstance),
                    0,
                ),
            }
        }
        Ok(())
    }

    fn set_rasterizer_state(&mut self, state: Handle) -> Result<()> {
        unsafe {
            self.RSSetState(state.as_ptr());
        }
        Ok(())
    }

    fn set_depth_stencil_state(&mut self, state: Handle, stencil_reference: u32) -> Result<()> {
        unsafe {
            self.OMSetDepthStencilState(state.as_ptr(), stencil_reference);
        }
        Ok(())
    }

    fn set_blend_state(
        &mut self,
        state: Handle,
        blend_factor: Option<[f32; 4]>,
        sample_mask: u32,
    ) -> Result<()> {
        let blend_factor = blend_factor.unwrap_or(DEFAULT_BLEND_FACTOR);
        unsafe {
            self.OMSetBlendState(state.as_ptr(), &blend_factor, sample_mask);
        }
        Ok(())
    }

    fn set_viewport(&mut self, viewport: &Viewport) -> Result<()> {
        unsafe {
            self.RSSetViewports(1, viewport as *const Viewport as *const d3d11::D3D11_VIEWPORT);
        }
        Ok(())
    }

    fn set_scissor_rect(&mut self, rect: ScissorRect) -> Result<()> {
        let rect = d3d11::D3D11_RECT {
            left: rect.left,
            top: rect.top,
            right: rect.right,
            bottom: rect.bottom,
        };
        unsafe {
            self.RSSetScissorRects(1, &rect);
        }
        Ok(())
    }

    fn draw_indexed_instanced(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        base_vertex: i32,
        first_instance: u32,
    ) -> Result<()> {
        unsafe {
            self.DrawIndexedInstanced(
                index_count,
                instance_count,
                first_index,
                base_vertex,
                first_instance,
            );
        }
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        unsafe {
            self.Draw(vertex_count, first_vertex);
        }
        Ok(())
    }

    fn clear_render_target(&mut self, view: Handle, color: [f32; 4]) -> Result<()> {
        unsafe {
            self.ClearRenderTargetView(view.as_ptr(), &color);
        }
        Ok(())
    }

    fn clear_depth_stencil(
        &mut self,
        view: Handle,
        planes: DepthStencilClear,
        depth: f32,
        stencil: u8,
    ) -> Result<()> {
        let flags = match planes {
            DepthStencilClear::Depth => d3d11::D3D11_CLEAR_DEPTH,
            DepthStencilClear::Stencil => d3d11::D3D11_CLEAR_STENCIL,
            DepthStencilClear::Both => d3d11::D3D11_CLEAR_DEPTH | d3d11::D3D11_CLEAR_STENCIL,
        };
        unsafe {
            self.ClearDepthStencilView(view.as_ptr(), flags, depth, stencil);
        }
        Ok(())
    }

    fn swap_chain(&self, handle: Handle) -> Option<&dxgi::IDXGISwapChain> {
        unsafe { handle.as_ptr::<dxgi::IDXGISwapChain>().as_ref() }
    }

    fn finish_command_list(&mut self) -> Result<ComPtr<d3d11::ID3D11CommandList>> {
        let list = unsafe {
            let mut list = null!(d3d11::ID3D11CommandList);
            self.FinishCommandList(FALSE, &mut list as *mut *mut d3d11::ID3D11CommandList)
                .err()
                .context("Failed to finish command list")?;
            comptrize!(list);
            list
        };
        Ok(list)
    }

    fn command_list_into_handle(list: ComPtr<d3d11::ID3D11CommandList>) -> Handle {
        list.into_handle()
    }

    fn execute_command_list(&mut self, list: &ComPtr<d3d11::ID3D11CommandList>) -> Result<()> {
        unsafe {
            self.ExecuteCommandList(list.as_ptr(), FALSE);
        }
        Ok(())
    }
}

/// Returns the immediate context of `device` with its own reference.
pub fn immediate_context(device: &d3d11::ID3D11Device) -> Result<ComPtr<d3d11::ID3D11DeviceContext>> {
    let context = unsafe {
        let mut context = null!(d3d11::ID3D11DeviceContext);
        device.GetImmediateContext(&mut context as *mut *mut d3d11::ID3D11DeviceContext);
        comptrize!(context);
        context
    };
    Ok(context)
}

/// Creates a deferred context for recording command lists.
pub fn create_deferred_context(
    device: &d3d11::ID3D11Device,
) -> Result<ComPtr<d3d11::ID3D11DeviceContext>> {
    let context = unsafe {
        let mut context = null!(d3d11::ID3D11DeviceContext);
        device
            .CreateDeferredContext(0, &mut context as *mut *mut d3d11::ID3D11DeviceContext)
            .err()
            .context("Failed to create deferred context")?;
        comptrize!(context);
        context
    };
    debug!("Created deferred context {:?}", context.as_ptr());
    Ok(context)
}

/// Releases the reference behind `context`.
pub fn release_context(context: Handle) -> Result<()> {
    match ComPtr::<d3d11::ID3D11DeviceContext>::from_handle(context) {
        Some(context) => {
            drop(context);
            Ok(())
        }
        None => bail!("Device context pointer must not be null."),
    }
}
