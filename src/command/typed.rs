//! Typed render commands and their mapping to the flat record.

use super::{pack_u32_pair, unpack_u32_pair, Instruction, RawCommand};
use crate::{
    error::DispatchError,
    pipeline::{
        Handle, PrimitiveTopology, ShaderStage, Viewport, MAX_CONSTANT_BUFFERS,
        MAX_RENDER_TARGETS, MAX_SAMPLERS, MAX_SHADER_RESOURCES, MAX_VERTEX_BUFFERS,
    },
};

use std::{cell::Cell, convert::TryFrom, mem::align_of, slice};

/// Arguments of an indexed, instanced draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawIndexedInstanced {
    pub base_vertex: i32,
    pub first_index: u32,
    pub index_count: u32,
    pub first_instance: u32,
    pub instance_count: u32,
}

/// One pipeline operation with its arguments.
///
/// Borrowed arrays and blobs must stay alive until the command is dispatched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command<'a> {
    NoOperation,
    SetPrimitiveTopology(PrimitiveTopology),
    SetInputLayout(Handle),
    /// Binds from slot 0 with zero offsets. `strides` pairs with `buffers`.
    SetVertexBuffers {
        buffers: &'a [Handle],
        strides: &'a [u32],
    },
    SetInstanceBuffer {
        buffer: Handle,
        slot: u32,
    },
    SetIndexBuffer(Handle),
    SetRenderTargets {
        render_targets: &'a [Handle],
        depth_stencil: Handle,
    },
    /// Write-discard into a constant buffer.
    DiscardWrite {
        buffer: Handle,
        data: &'a [u8],
    },
    SetConstantBuffers {
        stage: ShaderStage,
        start_slot: u32,
        buffers: &'a [Handle],
    },
    SetSamplers {
        stage: ShaderStage,
        start_slot: u32,
        samplers: &'a [Handle],
    },
    SetShaderResources {
        stage: ShaderStage,
        start_slot: u32,
        views: &'a [Handle],
    },
    SetShader {
        stage: ShaderStage,
        shader: Handle,
    },
    SetRasterizerState(Handle),
    SetDepthStencilState(Handle),
    SetBlendState(Handle),
    SetViewport(&'a Viewport),
    DrawIndexedInstanced(DrawIndexedInstanced),
    Draw {
        first_vertex: u32,
        vertex_count: u32,
    },
    ClearRenderTarget(Handle),
    ClearDepthStencil(Handle),
    SwapChainPresent(Handle),
    /// The finished list's handle is stored into the cell.
    FinishCommandList(&'a Cell<Handle>),
    /// Write-discard into any dynamic buffer.
    BufferWrite {
        buffer: Handle,
        data: &'a [u8],
    },
}

impl<'a> Command<'a> {
    /// Returns the instruction tag this command encodes to.
    pub fn instruction(&self) -> Instruction {
        use ShaderStage::*;

        match self {
            Command::NoOperation => Instruction::NoOperation,
            Command::SetPrimitiveTopology(_) => Instruction::SetPrimitiveTopology,
            Command::SetInputLayout(_) => Instruction::SetInputLayout,
            Command::SetVertexBuffers { .. } => Instruction::SetVertexBuffers,
            Command::SetInstanceBuffer { .. } => Instruction::SetInstanceBuffer,
            Command::SetIndexBuffer(_) => Instruction::SetIndexBuffer,
            Command::SetRenderTargets { .. } => Instruction::SetRenderTargets,
            Command::DiscardWrite { .. } => Instruction::CBDiscardWrite,
            Command::SetConstantBuffers { stage: Vertex, .. } => Instruction::VSSetCBuffers,
            Command::SetConstantBuffers { stage: Fragment, .. } => Instruction::FSSetCBuffers,
            Command::SetSamplers { stage: Vertex, .. } => Instruction::VSSetSamplers,
            Command::SetSamplers { stage: Fragment, .. } => Instruction::FSSetSamplers,
            Command::SetShaderResources { stage: Vertex, .. } => Instruction::VSSetResources,
            Command::SetShaderResources { stage: Fragment, .. } => Instruction::FSSetResources,
            Command::SetShader { stage: Vertex, .. } => Instruction::VSSetShader,
            Command::SetShader { stage: Fragment, .. } => Instruction::FSSetShader,
            Command::SetRasterizerState(_) => Instruction::SetRSState,
            Command::SetDepthStencilState(_) => Instruction::SetDSState,
            Command::SetBlendState(_) => Instruction::SetBlendState,
            Command::SetViewport(_) => Instruction::SetViewport,
            Command::DrawIndexedInstanced(_) => Instruction::DrawIndexedInstanced,
            Command::Draw { .. } => Instruction::Draw,
            Command::ClearRenderTarget(_) => Instruction::ClearRenderTarget,
            Command::ClearDepthStencil(_) => Instruction::ClearDepthStencil,
            Command::SwapChainPresent(_) => Instruction::SwapChainPresent,
            Command::FinishCommandList(_) => Instruction::FinishCommandList,
            Command::BufferWrite { .. } => Instruction::BufferWrite,
        }
    }

    /// Checks counts and required handles.
    pub fn validate(&self) -> Result<(), DispatchError> {
        match *self {
            Command::SetVertexBuffers { buffers, strides } => {
                check_count("vertex buffer", buffers.len(), MAX_VERTEX_BUFFERS)?;
                if strides.len() != buffers.len() {
                    return Err(DispatchError::invalid(format!(
                        "{} vertex buffers were given {} strides.",
                        buffers.len(),
                        strides.len()
                    )));
                }
            }
            Command::SetRenderTargets { render_targets, .. } => {
                check_count("render target", render_targets.len(), MAX_RENDER_TARGETS)?;
            }
            Command::SetConstantBuffers {
                start_slot,
                buffers,
                ..
            } => check_range("constant buffer", start_slot, buffers.len(), MAX_CONSTANT_BUFFERS)?,
            Command::SetSamplers {
                start_slot,
                samplers,
                ..
            } => check_range("sampler", start_slot, samplers.len(), MAX_SAMPLERS)?,
            Command::SetShaderResources {
                start_slot, views, ..
            } => check_range("shader resource", start_slot, views.len(), MAX_SHADER_RESOURCES)?,
            Command::DiscardWrite { buffer, data } | Command::BufferWrite { buffer, data } => {
                if buffer.is_null() {
                    return Err(DispatchError::invalid("Buffer pointer must not be null."));
                }
                if data.len() > u32::MAX as usize {
                    return Err(DispatchError::invalid("Buffer write exceeds 4 GiB."));
                }
            }
            Command::ClearRenderTarget(view) if view.is_null() => {
                return Err(DispatchError::invalid(
                    "Render target view must not be null.",
                ));
            }
            Command::ClearDepthStencil(view) if view.is_null() => {
                return Err(DispatchError::invalid(
                    "Depth stencil view must not be null.",
                ));
            }
            _ => (),
        }
        Ok(())
    }

    /// Flattens this command into its interop record.
    pub fn encode(&self) -> Result<RawCommand, DispatchError> {
        self.validate()?;

        let instruction = self.instruction();
        let raw = match *self {
            Command::NoOperation => RawCommand::no_operation(),
            Command::SetPrimitiveTopology(topology) => {
                RawCommand::new(instruction, topology as u32 as u64, 0, 0)
            }
            Command::SetInputLayout(handle)
            | Command::SetIndexBuffer(handle)
            | Command::SetShader { shader: handle, .. }
            | Command::SetRasterizerState(handle)
            | Command::SetDepthStencilState(handle)
            | Command::SetBlendState(handle)
            | Command::ClearRenderTarget(handle)
            | Command::ClearDepthStencil(handle)
            | Command::SwapChainPresent(handle) => {
                RawCommand::new(instruction, handle_slot(handle), 0, 0)
            }
            Command::SetVertexBuffers { buffers, strides } => RawCommand::new(
                instruction,
                pointer_slot(buffers.as_ptr()),
                pointer_slot(strides.as_ptr()),
                buffers.len() as u64,
            ),
            Command::SetInstanceBuffer { buffer, slot } => {
                RawCommand::new(instruction, handle_slot(buffer), slot as u64, 0)
            }
            Command::SetRenderTargets {
                render_targets,
                depth_stencil,
            } => RawCommand::new(
                instruction,
                pointer_slot(render_targets.as_ptr()),
                handle_slot(depth_stencil),
                render_targets.len() as u64,
            ),
            Command::DiscardWrite { buffer, data } | Command::BufferWrite { buffer, data } => {
                RawCommand::new(
                    instruction,
                    handle_slot(buffer),
                    pointer_slot(data.as_ptr()),
                    data.len() as u64,
                )
            }
            Command::SetConstantBuffers {
                start_slot,
                buffers: handles,
                ..
            }
            | Command::SetSamplers {
                start_slot,
                samplers: handles,
                ..
            }
            | Command::SetShaderResources {
                start_slot,
                views: handles,
                ..
            } => RawCommand::new(
                instruction,
                pointer_slot(handles.as_ptr()),
                handles.len() as u64,
                start_slot as u64,
            ),
            Command::SetViewport(viewport) => {
                RawCommand::new(instruction, pointer_slot(viewport as *const Viewport), 0, 0)
            }
            Command::DrawIndexedInstanced(args) => RawCommand::new(
                instruction,
                args.base_vertex as u32 as u64,
                pack_u32_pair(args.first_index, args.index_count),
                pack_u32_pair(args.first_instance, args.instance_count),
            ),
            Command::Draw {
                first_vertex,
                vertex_count,
            } => RawCommand::new(instruction, first_vertex as u64, vertex_count as u64, 0),
            Command::FinishCommandList(out) => {
                RawCommand::new(instruction, pointer_slot(out.as_ptr()), 0, 0)
            }
        };

        Ok(raw)
    }

    /// Reads a record back into a typed command.
    ///
    /// # Safety
    /// Every pointer slot `instruction` defines must either be null or point to
    /// memory valid for `'a` holding the element count the record states.
    pub unsafe fn decode(
        instruction: Instruction,
        raw: &RawCommand,
    ) -> Result<Command<'a>, DispatchError> {
        use ShaderStage::*;

        let (arg1, arg2, arg3) = (raw.arg1, raw.arg2, raw.arg3);
        let command = match instruction {
            Instruction::NoOperation => Command::NoOperation,
            Instruction::SetPrimitiveTopology => {
                let topology = PrimitiveTopology::try_from(low_u32(arg1)).map_err(|value| {
                    DispatchError::invalid(format!("Unknown primitive topology: {}.", value))
                })?;
                Command::SetPrimitiveTopology(topology)
            }
            Instruction::SetInputLayout => Command::SetInputLayout(slot_handle(arg1)),
            Instruction::SetVertexBuffers => {
                let count = low_u32(arg3) as usize;
                check_count("vertex buffer", count, MAX_VERTEX_BUFFERS)?;
                Command::SetVertexBuffers {
                    buffers: array_arg(arg1, count, "Vertex buffer")?,
                    strides: array_arg(arg2, count, "Vertex buffer stride")?,
                }
            }
            Instruction::SetInstanceBuffer => Command::SetInstanceBuffer {
                buffer: slot_handle(arg1),
                slot: low_u32(arg2),
            },
            Instruction::SetIndexBuffer => Command::SetIndexBuffer(slot_handle(arg1)),
            Instruction::SetRenderTargets => {
                let count = low_u32(arg3) as usize;
                check_count("render target", count, MAX_RENDER_TARGETS)?;
                Command::SetRenderTargets {
                    render_targets: array_arg(arg1, count, "Render target view")?,
                    depth_stencil: slot_handle(arg2),
                }
            }
            Instruction::CBDiscardWrite => Command::DiscardWrite {
                buffer: slot_handle(arg1),
                data: array_arg(arg2, low_u32(arg3) as usize, "Buffer data")?,
            },
            Instruction::BufferWrite => Command::BufferWrite {
                buffer: slot_handle(arg1),
                data: array_arg(arg2, low_u32(arg3) as usize, "Buffer data")?,
            },
            Instruction::VSSetCBuffers | Instruction::FSSetCBuffers => {
                let (start_slot, count) = (low_u32(arg3), low_u32(arg2) as usize);
                check_range("constant buffer", start_slot, count, MAX_CONSTANT_BUFFERS)?;
                Command::SetConstantBuffers {
                    stage: stage_of(instruction == Instruction::VSSetCBuffers),
                    start_slot,
                    buffers: array_arg(arg1, count, "Constant buffer")?,
                }
            }
            Instruction::VSSetSamplers | Instruction::FSSetSamplers => {
                let (start_slot, count) = (low_u32(arg3), low_u32(arg2) as usize);
                check_range("sampler", start_slot, count, MAX_SAMPLERS)?;
                Command::SetSamplers {
                    stage: stage_of(instruction == Instruction::VSSetSamplers),
                    start_slot,
                    samplers: array_arg(arg1, count, "Sampler")?,
                }
            }
            Instruction::VSSetResources | Instruction::FSSetResources => {
                let (start_slot, count) = (low_u32(arg3), low_u32(arg2) as usize);
                check_range("shader resource", start_slot, count, MAX_SHADER_RESOURCES)?;
                Command::SetShaderResources {
                    stage: stage_of(instruction == Instruction::VSSetResources),
                    start_slot,
                    views: array_arg(arg1, count, "Shader resource view")?,
                }
            }
            Instruction::VSSetShader => Command::SetShader {
                stage: Vertex,
                shader: slot_handle(arg1),
            },
            Instruction::FSSetShader => Command::SetShader {
                stage: Fragment,
                shader: slot_handle(arg1),
            },
            Instruction::SetRSState => Command::SetRasterizerState(slot_handle(arg1)),
            Instruction::SetDSState => Command::SetDepthStencilState(slot_handle(arg1)),
            Instruction::SetBlendState => Command::SetBlendState(slot_handle(arg1)),
            Instruction::SetViewport => Command::SetViewport(reference_arg(arg1, "Viewport")?),
            Instruction::DrawIndexedInstanced => {
                let (first_index, index_count) = unpack_u32_pair(arg2);
                let (first_instance, instance_count) = unpack_u32_pair(arg3);
                Command::DrawIndexedInstanced(DrawIndexedInstanced {
                    base_vertex: low_u32(arg1) as i32,
                    first_index,
                    index_count,
                    first_instance,
                    instance_count,
                })
            }
            Instruction::Draw => Command::Draw {
                first_vertex: low_u32(arg1),
                vertex_count: low_u32(arg2),
            },
            Instruction::ClearRenderTarget => Command::ClearRenderTarget(slot_handle(arg1)),
            Instruction::ClearDepthStencil => Command::ClearDepthStencil(slot_handle(arg1)),
            Instruction::SwapChainPresent => Command::SwapChainPresent(slot_handle(arg1)),
            Instruction::FinishCommandList => {
                Command::FinishCommandList(reference_arg(arg1, "Command list output")?)
            }
        };

        command.validate()?;
        Ok(command)
    }
}

fn stage_of(is_vertex: bool) -> ShaderStage {
    if is_vertex {
        ShaderStage::Vertex
    } else {
        ShaderStage::Fragment
    }
}

fn low_u32(slot: u64) -> u32 {
    slot as u32
}

fn slot_handle(slot: u64) -> Handle {
    Handle(slot as usize)
}

fn handle_slot(handle: Handle) -> u64 {
    handle.0 as u64
}

fn pointer_slot<T>(pointer: *const T) -> u64 {
    pointer as usize as u64
}

fn check_count(what: &str, count: usize, max: usize) -> Result<(), DispatchError> {
    if count > max {
        return Err(DispatchError::invalid(format!(
            "Maximum of {} {}s permitted, {} given.",
            max, what, count
        )));
    }
    Ok(())
}

fn check_range(what: &str, start_slot: u32, count: usize, max: usize) -> Result<(), DispatchError> {
    // Slice lengths stay below isize::MAX, so the sum fits.
    let end = start_slot as u64 + count as u64;
    if end > max as u64 {
        return Err(DispatchError::invalid(format!(
            "{} slots {}..{} exceed the {} available.",
            what, start_slot, end, max
        )));
    }
    Ok(())
}

/// Counts must already be checked against their slot limits.
unsafe fn array_arg<'a, T>(
    slot: u64,
    count: usize,
    what: &str,
) -> Result<&'a [T], DispatchError> {
    if count == 0 {
        return Ok(&[]);
    }
    let pointer = slot as usize as *const T;
    if pointer.is_null() {
        return Err(DispatchError::invalid(format!(
            "{} array pointer must not be null.",
            what
        )));
    }
    if (pointer as usize) % align_of::<T>() != 0 {
        return Err(DispatchError::invalid(format!(
            "{} array pointer is misaligned.",
            what
        )));
    }
    Ok(slice::from_raw_parts(pointer, count))
}

unsafe fn reference_arg<'a, T>(slot: u64, what: &str) -> Result<&'a T, DispatchError> {
    let pointer = slot as usize as *const T;
    if (pointer as usize) % align_of::<T>() != 0 {
        return Err(DispatchError::invalid(format!(
            "{} pointer is misaligned.",
            what
        )));
    }
    pointer
        .as_ref()
        .ok_or_else(|| DispatchError::invalid(format!("{} pointer must not be null.", what)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(command: Command<'_>) -> Command<'_> {
        let raw = command.encode().expect("encodable");
        let instruction = raw.instruction().expect("known instruction");
        unsafe { Command::decode(instruction, &raw) }.expect("decodable")
    }

    #[test]
    fn draw_indexed_instanced_unpacks_five_scalars_in_order() {
        let raw = RawCommand::new(
            Instruction::DrawIndexedInstanced,
            5,
            pack_u32_pair(10, 36),
            pack_u32_pair(0, 4),
        );
        let command = unsafe { Command::decode(Instruction::DrawIndexedInstanced, &raw) }.unwrap();

        assert_eq!(
            command,
            Command::DrawIndexedInstanced(DrawIndexedInstanced {
                base_vertex: 5,
                first_index: 10,
                index_count: 36,
                first_instance: 0,
                instance_count: 4,
            })
        );
    }

    #[test]
    fn negative_base_vertex_survives_the_slot() {
        let args = DrawIndexedInstanced {
            base_vertex: -12,
            index_count: 3,
            instance_count: 1,
            ..Default::default()
        };
        let raw = Command::DrawIndexedInstanced(args).encode().unwrap();
        assert_eq!({ raw.arg1 }, 0xFFFF_FFF4);
        assert_eq!(round_trip(Command::DrawIndexedInstanced(args)), Command::DrawIndexedInstanced(args));
    }

    #[test]
    fn stage_selects_instruction() {
        let buffers = [Handle(0x10)];
        let vertex = Command::SetConstantBuffers {
            stage: ShaderStage::Vertex,
            start_slot: 2,
            buffers: &buffers,
        };
        let fragment = Command::SetShaderResources {
            stage: ShaderStage::Fragment,
            start_slot: 0,
            views: &buffers,
        };
        assert_eq!(vertex.instruction(), Instruction::VSSetCBuffers);
        assert_eq!(fragment.instruction(), Instruction::FSSetResources);

        let raw = vertex.encode().unwrap();
        assert_eq!(({ raw.arg2 }, { raw.arg3 }), (1, 2));
    }

    #[test]
    fn borrowed_arrays_are_read_back_in_place() {
        let buffers = [Handle(0xA0), Handle(0xB0)];
        let strides = [32, 12];
        let command = round_trip(Command::SetVertexBuffers {
            buffers: &buffers,
            strides: &strides,
        });

        match command {
            Command::SetVertexBuffers { buffers: b, strides: s } => {
                assert_eq!(b.as_ptr(), buffers.as_ptr());
                assert_eq!(b, &buffers);
                assert_eq!(s, &strides);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn null_array_with_count_is_rejected() {
        let raw = RawCommand::new(Instruction::VSSetSamplers, 0, 3, 0);
        let error = unsafe { Command::decode(Instruction::VSSetSamplers, &raw) }.unwrap_err();
        assert!(matches!(error, DispatchError::InvalidArgument(_)));
    }

    #[test]
    fn null_array_without_count_unbinds() {
        let raw = RawCommand::new(Instruction::SetRenderTargets, 0, 0xD5, 0);
        let command = unsafe { Command::decode(Instruction::SetRenderTargets, &raw) }.unwrap();
        assert_eq!(
            command,
            Command::SetRenderTargets {
                render_targets: &[],
                depth_stencil: Handle(0xD5),
            }
        );
    }

    #[test]
    fn null_viewport_is_rejected() {
        let raw = RawCommand::new(Instruction::SetViewport, 0, 0, 0);
        let error = unsafe { Command::decode(Instruction::SetViewport, &raw) }.unwrap_err();
        assert_eq!(error.to_string(), "Viewport pointer must not be null.");
    }

    #[test]
    fn counts_above_the_api_limits_are_rejected() {
        let targets = [Handle(1); 9];
        let error = Command::SetRenderTargets {
            render_targets: &targets,
            depth_stencil: Handle::NULL,
        }
        .encode()
        .unwrap_err();
        assert!(matches!(error, DispatchError::InvalidArgument(_)));

        let samplers = [Handle(1); 2];
        let error = Command::SetSamplers {
            stage: ShaderStage::Fragment,
            start_slot: 15,
            samplers: &samplers,
        }
        .validate()
        .unwrap_err();
        assert!(matches!(error, DispatchError::InvalidArgument(_)));
    }

    fn decode_error(raw: RawCommand) -> String {
        let instruction = raw.instruction().expect("known instruction");
        unsafe { Command::decode(instruction, &raw) }
            .unwrap_err()
            .to_string()
    }

    /// Aligned but not backed by memory; only valid if no slice is formed.
    fn dangling_handles() -> u64 {
        std::ptr::NonNull::<Handle>::dangling().as_ptr() as usize as u64
    }

    #[test]
    fn over_limit_counts_fail_before_arrays_are_read() {
        let array = dangling_handles();

        assert_eq!(
            decode_error(RawCommand::new(Instruction::SetVertexBuffers, array, array, 33)),
            "Maximum of 32 vertex buffers permitted, 33 given."
        );
        assert_eq!(
            decode_error(RawCommand::new(Instruction::SetRenderTargets, array, 0, 9)),
            "Maximum of 8 render targets permitted, 9 given."
        );
        assert_eq!(
            decode_error(RawCommand::new(Instruction::VSSetCBuffers, array, 2, 13)),
            "constant buffer slots 13..15 exceed the 14 available."
        );
        assert_eq!(
            decode_error(RawCommand::new(Instruction::FSSetResources, array, 1, 128)),
            "shader resource slots 128..129 exceed the 128 available."
        );
        assert_eq!(
            decode_error(RawCommand::new(Instruction::FSSetSamplers, array, 17, 0)),
            "sampler slots 0..17 exceed the 16 available."
        );
    }

    #[test]
    fn slot_ranges_near_u32_max_do_not_wrap() {
        let array = dangling_handles();
        let raw = RawCommand::new(Instruction::VSSetCBuffers, array, 1, u32::MAX as u64);
        assert_eq!(
            decode_error(raw),
            "constant buffer slots 4294967295..4294967296 exceed the 14 available."
        );

        let views = [Handle(1)];
        let error = Command::SetShaderResources {
            stage: ShaderStage::Vertex,
            start_slot: u32::MAX,
            views: &views,
        }
        .validate()
        .unwrap_err();
        assert!(matches!(error, DispatchError::InvalidArgument(_)));
    }

    #[test]
    fn buffer_writes_require_a_buffer_and_data() {
        let data = [7u8; 4];
        let data_slot = data.as_ptr() as usize as u64;

        for &instruction in &[Instruction::CBDiscardWrite, Instruction::BufferWrite] {
            assert_eq!(
                decode_error(RawCommand::new(instruction, 0, data_slot, 4)),
                "Buffer pointer must not be null."
            );
            assert_eq!(
                decode_error(RawCommand::new(instruction, 0x50, 0, 4)),
                "Buffer data array pointer must not be null."
            );

            let empty = RawCommand::new(instruction, 0x50, 0, 0);
            let command = unsafe { Command::decode(instruction, &empty) }.unwrap();
            assert_eq!(command.instruction(), instruction);
        }
    }

    #[test]
    fn mismatched_strides_are_rejected() {
        let buffers = [Handle(1), Handle(2)];
        let strides = [16];
        let result = Command::SetVertexBuffers {
            buffers: &buffers,
            strides: &strides,
        }
        .encode();
        assert!(result.is_err());
    }

    #[test]
    fn unknown_topology_is_rejected() {
        let raw = RawCommand::new(Instruction::SetPrimitiveTopology, 99, 0, 0);
        let error = unsafe { Command::decode(Instruction::SetPrimitiveTopology, &raw) }.unwrap_err();
        assert_eq!(error.to_string(), "Unknown primitive topology: 99.");
    }

    #[test]
    fn finish_command_list_points_at_the_cell() {
        let out = Cell::new(Handle::NULL);
        let raw = Command::FinishCommandList(&out).encode().unwrap();
        assert_eq!({ raw.arg1 }, out.as_ptr() as usize as u64);

        match unsafe { Command::decode(Instruction::FinishCommandList, &raw) }.unwrap() {
            Command::FinishCommandList(cell) => {
                cell.set(Handle(0x1234));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(out.get(), Handle(0x1234));
    }
}
