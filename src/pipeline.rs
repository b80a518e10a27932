//! The graphics-context seam the dispatcher drives.

use anyhow::Result;
use std::{convert::TryFrom, fmt};

/// Stride of one instance-buffer element (4x4 `f32` matrix).
pub const INSTANCE_STRIDE: u32 = 64;

/// Stencil reference value used when binding a depth-stencil state.
pub const STENCIL_REFERENCE: u32 = 0xFF;

/// Sample mask used when binding a blend state.
pub const BLEND_SAMPLE_MASK: u32 = 0xFFFF_FFFF;

/// Color a render target is cleared to.
pub const RENDER_TARGET_CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 0.0];

/// Depth a depth-stencil view is cleared to.
pub const DEPTH_CLEAR_VALUE: f32 = 1.0;

/// Stencil value a depth-stencil view is cleared to.
pub const STENCIL_CLEAR_VALUE: u8 = 0xFF;

/// Input-assembler vertex buffer slots (`D3D11_IA_VERTEX_INPUT_RESOURCE_SLOT_COUNT`).
pub const MAX_VERTEX_BUFFERS: usize = 32;

/// Simultaneous render targets (`D3D11_SIMULTANEOUS_RENDER_TARGET_COUNT`).
pub const MAX_RENDER_TARGETS: usize = 8;

/// Constant buffer slots per stage.
pub const MAX_CONSTANT_BUFFERS: usize = 14;

/// Sampler slots per stage.
pub const MAX_SAMPLERS: usize = 16;

/// Shader resource slots per stage.
pub const MAX_SHADER_RESOURCES: usize = 128;

/// An opaque, pointer-sized native object handle. Zero is null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Handle(pub usize);

impl Handle {
    pub const NULL: Handle = Handle(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Reinterprets the handle as a pointer.
    pub fn as_ptr<T>(self) -> *mut T {
        self.0 as *mut T
    }

    pub fn from_ptr<T>(pointer: *const T) -> Handle {
        Handle(pointer as usize)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

/// Layout-identical to `D3D11_VIEWPORT`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct Viewport {
    pub top_left_x: f32,
    pub top_left_y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Creates a viewport at the origin covering `dimension`.
    pub const fn new(dimension: (u32, u32)) -> Viewport {
        Viewport {
            top_left_x: 0.0,
            top_left_y: 0.0,
            width: dimension.0 as f32,
            height: dimension.1 as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }

    /// The scissor rectangle bound alongside this viewport: `(0, 0)-(width, height)`.
    pub fn scissor_rect(&self) -> ScissorRect {
        ScissorRect {
            left: 0,
            top: 0,
            right: self.width as i32,
            bottom: self.height as i32,
        }
    }
}

/// Layout-identical to `D3D11_RECT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(C)]
pub struct ScissorRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// Input-assembler topology. Values are `D3D11_PRIMITIVE_TOPOLOGY_xxx`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum PrimitiveTopology {
    Undefined = 0,
    PointList = 1,
    LineList = 2,
    LineStrip = 3,
    TriangleList = 4,
    TriangleStrip = 5,
}

impl Default for PrimitiveTopology {
    fn default() -> PrimitiveTopology {
        PrimitiveTopology::TriangleList
    }
}

impl TryFrom<u32> for PrimitiveTopology {
    type Error = u32;

    fn try_from(value: u32) -> Result<PrimitiveTopology, u32> {
        match value {
            0 => Ok(PrimitiveTopology::Undefined),
            1 => Ok(PrimitiveTopology::PointList),
            2 => Ok(PrimitiveTopology::LineList),
            3 => Ok(PrimitiveTopology::LineStrip),
            4 => Ok(PrimitiveTopology::TriangleList),
            5 => Ok(PrimitiveTopology::TriangleStrip),
            other => Err(other),
        }
    }
}

/// Programmable stage a binding targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    /// Pixel shader stage.
    Fragment,
}

impl TryFrom<u32> for ShaderStage {
    type Error = u32;

    /// 0 is the vertex stage, 1 the pixel stage.
    fn try_from(value: u32) -> Result<ShaderStage, u32> {
        match value {
            0 => Ok(ShaderStage::Vertex),
            1 => Ok(ShaderStage::Fragment),
            other => Err(other),
        }
    }
}

/// Index element format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    U16,
    U32,
}

/// Index format every index buffer is bound with.
pub const INDEX_BUFFER_FORMAT: IndexFormat = IndexFormat::U32;

/// Planes touched by a depth-stencil clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthStencilClear {
    Depth,
    Stencil,
    Both,
}

/// Presentation target of a window.
pub trait SwapChain {
    fn present(&self, sync_interval: u32, flags: u32) -> Result<()>;
}

/// A graphics context (immediate or deferred) that render commands are replayed against.
///
/// Each method is one native call. Implementations must not reorder or batch them.
/// Handles are trusted: callers of the dispatcher guarantee that every non-null
/// handle names a live object of the expected kind.
pub trait Pipeline {
    /// A finished deferred command list. Dropping it releases it.
    type CommandList;

    /// The swap chain type handles resolve to.
    type SwapChain: SwapChain + ?Sized;

    fn set_primitive_topology(&mut self, topology: PrimitiveTopology) -> Result<()>;

    fn set_input_layout(&mut self, layout: Handle) -> Result<()>;

    fn set_vertex_buffers(
        &mut self,
        start_slot: u32,
        buffers: &[Handle],
        strides: &[u32],
        offsets: &[u32],
    ) -> Result<()>;

    fn set_index_buffer(&mut self, buffer: Handle, format: IndexFormat, offset: u32)
        -> Result<()>;

    fn set_render_targets(&mut self, render_targets: &[Handle], depth_stencil: Handle)
        -> Result<()>;

    /// Maps `buffer` with write-discard, copies `data` into it and unmaps it.
    fn write_discard(&mut self, buffer: Handle, data: &[u8]) -> Result<()>;

    fn set_constant_buffers(
        &mut self,
        stage: ShaderStage,
        start_slot: u32,
        buffers: &[Handle],
    ) -> Result<()>;

    fn set_samplers(&mut self, stage: ShaderStage, start_slot: u32, samplers: &[Handle])
        -> Result<()>;

    fn set_shader_resources(
        &mut self,
        stage: ShaderStage,
        start_slot: u32,
        views: &[Handle],
    ) -> Result<()>;

    /// Binds a shader without class instances.
    fn set_shader(&mut self, stage: ShaderStage, shader: Handle) -> Result<()>;

    fn set_rasterizer_state(&mut self, state: Handle) -> Result<()>;

    fn set_depth_stencil_state(&mut self, state: Handle, stencil_reference: u32) -> Result<()>;

    /// `blend_factor` of `None` selects the API default.
    fn set_blend_state(
        &mut self,
        state: Handle,
        blend_factor: Option<[f32; 4]>,
        sample_mask: u32,
    ) -> Result<()>;

    fn set_viewport(&mut self, viewport: &Viewport) -> Result<()>;

    fn set_scissor_rect(&mut self, rect: ScissorRect) -> Result<()>;

    fn draw_indexed_instanced(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        base_vertex: i32,
        first_instance: u32,
    ) -> Result<()>;

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()>;

    fn clear_render_target(&mut self, view: Handle, color: [f32; 4]) -> Result<()>;

    fn clear_depth_stencil(
        &mut self,
        view: Handle,
        planes: DepthStencilClear,
        depth: f32,
        stencil: u8,
    ) -> Result<()>;

    /// Resolves a swap chain handle. `None` for a null handle.
    fn swap_chain(&self, handle: Handle) -> Option<&Self::SwapChain>;

    /// Ends recording on a deferred context.
    fn finish_command_list(&mut self) -> Result<Self::CommandList>;

    /// Hands ownership of a finished list over to a raw handle.
    fn command_list_into_handle(list: Self::CommandList) -> Handle;

    /// Submits a finished list. The list is released when `list` is dropped.
    fn execute_command_list(&mut self, list: &Self::CommandList) -> Result<()>;
}
