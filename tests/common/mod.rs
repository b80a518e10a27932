//! Recording pipeline shared by the integration tests.

#![allow(dead_code)]

use derky_rcq::{
    error::{HresultError, DXGI_ERROR_DEVICE_HUNG},
    pipeline::{
        DepthStencilClear, Handle, IndexFormat, Pipeline, PrimitiveTopology, ScissorRect,
        ShaderStage, SwapChain, Viewport,
    },
};

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
};

use anyhow::Result;

/// One native call observed by the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SetPrimitiveTopology(PrimitiveTopology),
    SetInputLayout(Handle),
    SetVertexBuffers {
        start_slot: u32,
        buffers: Vec<Handle>,
        strides: Vec<u32>,
        offsets: Vec<u32>,
    },
    SetIndexBuffer {
        buffer: Handle,
        format: IndexFormat,
        offset: u32,
    },
    SetRenderTargets {
        render_targets: Vec<Handle>,
        depth_stencil: Handle,
    },
    WriteDiscard {
        buffer: Handle,
        data: Vec<u8>,
    },
    SetConstantBuffers {
        stage: ShaderStage,
        start_slot: u32,
        buffers: Vec<Handle>,
    },
    SetSamplers {
        stage: ShaderStage,
        start_slot: u32,
        samplers: Vec<Handle>,
    },
    SetShaderResources {
        stage: ShaderStage,
        start_slot: u32,
        views: Vec<Handle>,
    },
    SetShader {
        stage: ShaderStage,
        shader: Handle,
    },
    SetRasterizerState(Handle),
    SetDepthStencilState {
        state: Handle,
        stencil_reference: u32,
    },
    SetBlendState {
        state: Handle,
        blend_factor: Option<[f32; 4]>,
        sample_mask: u32,
    },
    SetViewport(Viewport),
    SetScissorRect(ScissorRect),
    DrawIndexedInstanced {
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        base_vertex: i32,
        first_instance: u32,
    },
    Draw {
        vertex_count: u32,
        first_vertex: u32,
    },
    ClearRenderTarget {
        view: Handle,
        color: [f32; 4],
    },
    ClearDepthStencil {
        view: Handle,
        planes: DepthStencilClear,
        depth: f32,
        stencil: u8,
    },
    Present {
        swap_chain: Handle,
        sync_interval: u32,
        flags: u32,
    },
    FinishCommandList {
        context: u32,
    },
    ExecuteCommandList {
        list: u32,
    },
    /// Pushed by deferred actions in queue tests.
    Marker(&'static str),
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

/// A finished list; counts how often lists are released.
#[derive(Debug)]
pub struct MockCommandList {
    pub id: u32,
    releases: Rc<Cell<u32>>,
}

impl Drop for MockCommandList {
    fn drop(&mut self) {
        self.releases.set(self.releases.get() + 1);
    }
}

#[derive(Debug)]
pub struct MockSwapChain {
    handle: Handle,
    calls: CallLog,
}

impl SwapChain for MockSwapChain {
    fn present(&self, sync_interval: u32, flags: u32) -> Result<()> {
        self.calls.borrow_mut().push(Call::Present {
            swap_chain: self.handle,
            sync_interval,
            flags,
        });
        Ok(())
    }
}

/// Records every call into a log shared with its swap chains and siblings.
#[derive(Debug)]
pub struct MockPipeline {
    pub id: u32,
    pub calls: CallLog,
    pub releases: Rc<Cell<u32>>,
    /// Calls at this position in the log fail with `DXGI_ERROR_DEVICE_HUNG`.
    pub fail_at: Option<usize>,
    swap_chains: HashMap<Handle, MockSwapChain>,
    next_list: Cell<u32>,
}

impl MockPipeline {
    pub fn new() -> MockPipeline {
        MockPipeline::with_log(0, Rc::default())
    }

    /// A pipeline writing into an existing log, such as a deferred context.
    pub fn with_log(id: u32, calls: CallLog) -> MockPipeline {
        MockPipeline {
            id,
            calls,
            releases: Rc::default(),
            fail_at: None,
            swap_chains: HashMap::new(),
            next_list: Cell::new(1),
        }
    }

    pub fn add_swap_chain(&mut self, handle: Handle) {
        let swap_chain = MockSwapChain {
            handle,
            calls: Rc::clone(&self.calls),
        };
        self.swap_chains.insert(handle, swap_chain);
    }

    pub fn command_list(&self) -> MockCommandList {
        let id = self.next_list.get();
        self.next_list.set(id + 1);
        MockCommandList {
            id,
            releases: Rc::clone(&self.releases),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn record(&mut self, call: Call) -> Result<()> {
        let mut calls = self.calls.borrow_mut();
        if self.fail_at == Some(calls.len()) {
            return Err(HresultError(DXGI_ERROR_DEVICE_HUNG).into());
        }
        calls.push(call);
        Ok(())
    }
}

impl Pipeline for MockPipeline {
    type CommandList = MockCommandList;
    type SwapChain = MockSwapChain;

    fn set_primitive_topology(&mut self, topology: PrimitiveTopology) -> Result<()> {
        self.record(Call::SetPrimitiveTopology(topology))
    }

    fn set_input_layout(&mut self, layout: Handle) -> Result<()> {
        self.record(Call::SetInputLayout(layout))
    }

    fn set_vertex_buffers(
        &mut self,
        start_slot: u32,
        buffers: &[Handle],
        strides: &[u32],
        offsets: &[u32],
    ) -> Result<()> {
        self.record(Call::SetVertexBuffers {
            start_slot,
            buffers: buffers.to_vec(),
            strides: strides.to_vec(),
            offsets: offsets.to_vec(),
        })
    }

    fn set_index_buffer(&mut self, buffer: Handle, format: IndexFormat, offset: u32) -> Result<()> {
        self.record(Call::SetIndexBuffer {
            buffer,
            format,
            offset,
        })
    }

    fn set_render_targets(&mut self, render_targets: &[Handle], depth_stencil: Handle) -> Result<()> {
        self.record(Call::SetRenderTargets {
            render_targets: render_targets.to_vec(),
            depth_stencil,
        })
    }

    fn write_discard(&mut self, buffer: Handle, data: &[u8]) -> Result<()> {
        self.record(Call::WriteDiscard {
            buffer,
            data: data.to_vec(),
        })
    }

    fn set_constant_buffers(
        &mut self,
        stage: ShaderStage,
        start_slot: u32,
        buffers: &[Handle],
    ) -> Result<()> {
        self.record(Call::SetConstantBuffers {
            stage,
            start_slot,
            buffers: buffers.to_vec(),
        })
    }

    fn set_samplers(&mut self, stage: ShaderStage, start_slot: u32, samplers: &[Handle]) -> Result<()> {
        self.record(Call::SetSamplers {
            stage,
            start_slot,
            samplers: samplers.to_vec(),
        })
    }

    fn set_shader_resources(
        &mut self,
        stage: ShaderStage,
        start_slot: u32,
        views: &[Handle],
    ) -> Result<()> {
        self.record(Call::SetShaderResources {
            stage,
            start_slot,
            views: views.to_vec(),
        })
    }

    fn set_shader(&mut self, stage: ShaderStage, shader: Handle) -> Result<()> {
        self.record(Call::SetShader { stage, shader })
    }

    fn set_rasterizer_state(&mut self, state: Handle) -> Result<()> {
        self.record(Call::SetRasterizerState(state))
    }

    fn set_depth_stencil_state(&mut self, state: Handle, stencil_reference: u32) -> Result<()> {
        self.record(Call::SetDepthStencilState {
            state,
            stencil_reference,
        })
    }

    fn set_blend_state(
        &mut self,
        state: Handle,
        blend_factor: Option<[f32; 4]>,
        sample_mask: u32,
    ) -> Result<()> {
        self.record(Call::SetBlendState {
            state,
            blend_factor,
            sample_mask,
        })
    }

    fn set_viewport(&mut self, viewport: &Viewport) -> Result<()> {
        self.record(Call::SetViewport(*viewport))
    }

    fn set_scissor_rect(&mut self, rect: ScissorRect) -> Result<()> {
        self.record(Call::SetScissorRect(rect))
    }

    fn draw_indexed_instanced(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        base_vertex: i32,
        first_instance: u32,
    ) -> Result<()> {
        self.record(Call::DrawIndexedInstanced {
            index_count,
            instance_count,
            first_index,
            base_vertex,
            first_instance,
        })
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.record(Call::Draw {
            vertex_count,
            first_vertex,
        })
    }

    fn clear_render_target(&mut self, view: Handle, color: [f32; 4]) -> Result<()> {
        self.record(Call::ClearRenderTarget { view, color })
    }

    fn clear_depth_stencil(
        &mut self,
        view: Handle,
        planes: DepthStencilClear,
        depth: f32,
        stencil: u8,
    ) -> Result<()> {
        self.record(Call::ClearDepthStencil {
            view,
            planes,
            depth,
            stencil,
        })
    }

    fn swap_chain(&self, handle: Handle) -> Option<&MockSwapChain> {
        self.swap_chains.get(&handle)
    }

    fn finish_command_list(&mut self) -> Result<MockCommandList> {
        let context = self.id;
        self.record(Call::FinishCommandList { context })?;
        Ok(self.command_list())
    }

    fn command_list_into_handle(list: MockCommandList) -> Handle {
        let handle = Handle(0x1000 + list.id as usize);
        std::mem::forget(list);
        handle
    }

    fn execute_command_list(&mut self, list: &MockCommandList) -> Result<()> {
        self.record(Call::ExecuteCommandList { list: list.id })
    }
}
