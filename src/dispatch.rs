//! Replays render commands against a [`Pipeline`].

use crate::{
    command::{Command, RawCommand},
    error::DispatchError,
    pipeline::{
        DepthStencilClear, Pipeline, SwapChain, BLEND_SAMPLE_MASK, DEPTH_CLEAR_VALUE,
        INDEX_BUFFER_FORMAT, INSTANCE_STRIDE, MAX_VERTEX_BUFFERS, RENDER_TARGET_CLEAR_COLOR,
        STENCIL_CLEAR_VALUE, STENCIL_REFERENCE,
    },
};

use log::{debug, trace};

/// Issues the native calls for one command.
///
/// # Safety
/// Every non-null handle in `command` must name a live object of the kind the
/// command expects, owned by the device `pipeline` belongs to.
pub unsafe fn execute<P: Pipeline + ?Sized>(
    pipeline: &mut P,
    command: &Command<'_>,
) -> Result<(), DispatchError> {
    command.validate()?;

    match *command {
        Command::NoOperation => Ok(()),
        Command::SetPrimitiveTopology(topology) => {
            native(pipeline.set_primitive_topology(topology))
        }
        Command::SetInputLayout(layout) => native(pipeline.set_input_layout(layout)),
        Command::SetVertexBuffers { buffers, strides } => {
            let offsets = [0u32; MAX_VERTEX_BUFFERS];
            native(pipeline.set_vertex_buffers(0, buffers, strides, &offsets[..buffers.len()]))
        }
        Command::SetInstanceBuffer { buffer, slot } => {
            native(pipeline.set_vertex_buffers(slot, &[buffer], &[INSTANCE_STRIDE], &[0]))
        }
        Command::SetIndexBuffer(buffer) => {
            native(pipeline.set_index_buffer(buffer, INDEX_BUFFER_FORMAT, 0))
        }
        Command::SetRenderTargets {
            render_targets,
            depth_stencil,
        } => native(pipeline.set_render_targets(render_targets, depth_stencil)),
        Command::DiscardWrite { buffer, data } | Command::BufferWrite { buffer, data } => {
            native(pipeline.write_discard(buffer, data))
        }
        Command::SetConstantBuffers {
            stage,
            start_slot,
            buffers,
        } => native(pipeline.set_constant_buffers(stage, start_slot, buffers)),
        Command::SetSamplers {
            stage,
            start_slot,
            samplers,
        } => native(pipeline.set_samplers(stage, start_slot, samplers)),
        Command::SetShaderResources {
            stage,
            start_slot,
            views,
        } => native(pipeline.set_shader_resources(stage, start_slot, views)),
        Command::SetShader { stage, shader } => native(pipeline.set_shader(stage, shader)),
        Command::SetRasterizerState(state) => native(pipeline.set_rasterizer_state(state)),
        Command::SetDepthStencilState(state) => {
            native(pipeline.set_depth_stencil_state(state, STENCIL_REFERENCE))
        }
        Command::SetBlendState(state) => {
            native(pipeline.set_blend_state(state, None, BLEND_SAMPLE_MASK))
        }
        Command::SetViewport(viewport) => {
            native(pipeline.set_viewport(viewport))?;
            native(pipeline.set_scissor_rect(viewport.scissor_rect()))
        }
        Command::DrawIndexedInstanced(args) => native(pipeline.draw_indexed_instanced(
            args.index_count,
            args.instance_count,
            args.first_index,
            args.base_vertex,
            args.first_instance,
        )),
        Command::Draw {
            first_vertex,
            vertex_count,
        } => native(pipeline.draw(vertex_count, first_vertex)),
        Command::ClearRenderTarget(view) => {
            native(pipeline.clear_render_target(view, RENDER_TARGET_CLEAR_COLOR))
        }
        Command::ClearDepthStencil(view) => native(pipeline.clear_depth_stencil(
            view,
            DepthStencilClear::Both,
            DEPTH_CLEAR_VALUE,
            STENCIL_CLEAR_VALUE,
        )),
        Command::SwapChainPresent(swap_chain) => {
            present_back_buffer(pipeline.swap_chain(swap_chain))
        }
        Command::FinishCommandList(out) => {
            let list = finish_command_list(pipeline)?;
            out.set(P::command_list_into_handle(list));
            Ok(())
        }
    }
}

/// Executes typed commands in order, stopping at the first failure.
///
/// # Safety
/// Same as [`execute`], for every command.
pub unsafe fn dispatch<P: Pipeline + ?Sized>(
    pipeline: &mut P,
    commands: &[Command<'_>],
) -> Result<(), DispatchError> {
    debug!("Dispatching {} commands", commands.len());
    for (index, command) in commands.iter().enumerate() {
        trace!("#{} {:?}", index, command);
        execute(pipeline, command).map_err(|e| e.at(index, command.instruction()))?;
    }
    Ok(())
}

/// Decodes and executes interop records in order, stopping at the first failure.
///
/// Commands before a failing one have been issued; nothing after it is.
///
/// # Safety
/// Every pointer slot must be valid for its instruction (see
/// [`Command::decode`]) and every non-null handle valid as for [`execute`].
pub unsafe fn flush_instructions<P: Pipeline + ?Sized>(
    pipeline: &mut P,
    commands: &[RawCommand],
) -> Result<(), DispatchError> {
    debug!("Flushing {} render commands", commands.len());
    flush_segment(pipeline, commands, 0)
}

/// Like [`flush_instructions`], reporting indices offset by `first_index`.
pub(crate) unsafe fn flush_segment<P: Pipeline + ?Sized>(
    pipeline: &mut P,
    commands: &[RawCommand],
    first_index: usize,
) -> Result<(), DispatchError> {
    for (offset, raw) in commands.iter().enumerate() {
        let index = first_index + offset;
        let instruction = raw
            .instruction()
            .map_err(|value| DispatchError::UnknownInstruction { index, value })?;
        let command = Command::decode(instruction, raw).map_err(|e| e.at(index, instruction))?;

        trace!("#{} {:?}", index, command);
        execute(pipeline, &command).map_err(|e| e.at(index, instruction))?;
    }
    Ok(())
}

/// Entry point for a caller-supplied context and record array.
///
/// # Safety
/// `context` must be null or exclusively borrowable for the call, and
/// `commands` must be null or point to `count` records satisfying
/// [`flush_instructions`].
pub unsafe fn flush_raw<P: Pipeline>(
    context: *mut P,
    commands: *const RawCommand,
    count: u32,
) -> Result<(), DispatchError> {
    let pipeline = context
        .as_mut()
        .ok_or_else(|| DispatchError::invalid("Device context pointer must not be null!"))?;
    if commands.is_null() {
        return Err(DispatchError::invalid(
            "Render command array pointer must not be null!",
        ));
    }
    if count == 0 {
        return Ok(());
    }

    let commands = std::slice::from_raw_parts(commands, count as usize);
    flush_instructions(pipeline, commands)
}

/// Presents the back buffer with sync interval 0 and no flags.
pub fn present_back_buffer<S: SwapChain + ?Sized>(
    swap_chain: Option<&S>,
) -> Result<(), DispatchError> {
    let swap_chain =
        swap_chain.ok_or_else(|| DispatchError::invalid("Swap chain pointer must not be null."))?;
    native(swap_chain.present(0, 0))
}

/// Submits the list in `slot` on `immediate`, then releases it.
///
/// The slot is emptied, so a repeated call fails without releasing anything.
pub fn execute_command_list<P: Pipeline + ?Sized>(
    immediate: &mut P,
    slot: &mut Option<P::CommandList>,
) -> Result<(), DispatchError> {
    let list = slot
        .take()
        .ok_or_else(|| DispatchError::invalid("Command list pointer must not be null."))?;
    debug!("Executing command list");
    native(immediate.execute_command_list(&list))
}

/// Ends recording on `deferred` and takes ownership of the finished list.
pub fn finish_command_list<P: Pipeline + ?Sized>(
    deferred: &mut P,
) -> Result<P::CommandList, DispatchError> {
    debug!("Finishing command list");
    native(deferred.finish_command_list())
}

/// Finishes every deferred context in order and executes its list on `immediate`.
pub fn execute_deferred_command_lists<P: Pipeline + ?Sized>(
    immediate: &mut P,
    deferred: &mut [Option<&mut P>],
) -> Result<(), DispatchError> {
    debug!("Executing {} deferred contexts", deferred.len());
    for (index, context) in deferred.iter_mut().enumerate() {
        let context = context.as_mut().ok_or_else(|| {
            DispatchError::invalid(format!(
                "Deferred context pointer at index {} was null.",
                index
            ))
        })?;
        let mut list = Some(finish_command_list(&mut **context)?);
        execute_command_list(immediate, &mut list)?;
    }
    Ok(())
}

/// Entry point for caller-supplied immediate and deferred context pointers.
///
/// Every non-null pointer must be distinct: a deferred entry equal to
/// `immediate` or to an earlier entry is rejected before any context is used.
///
/// # Safety
/// Non-null pointers must be exclusively borrowable for the call, and
/// `deferred` must be null or point to `count` context pointers.
pub unsafe fn execute_deferred_raw<P: Pipeline>(
    immediate: *mut P,
    deferred: *const *mut P,
    count: u32,
) -> Result<(), DispatchError> {
    if immediate.is_null() {
        return Err(DispatchError::invalid(
            "Immediate context pointer must not be null.",
        ));
    }
    if count == 0 {
        return Ok(());
    }
    if deferred.is_null() {
        return Err(DispatchError::invalid(
            "Deferred context array pointer must not be null.",
        ));
    }

    let pointers = std::slice::from_raw_parts(deferred, count as usize);
    for (index, &pointer) in pointers.iter().enumerate() {
        if pointer.is_null() {
            continue;
        }
        if pointer == immediate {
            return Err(DispatchError::invalid(format!(
                "Deferred context at index {} is the immediate context.",
                index
            )));
        }
        if pointers[..index].contains(&pointer) {
            return Err(DispatchError::invalid(format!(
                "Deferred context at index {} appears more than once.",
                index
            )));
        }
    }

    let mut contexts: Vec<_> = pointers.iter().map(|&pointer| pointer.as_mut()).collect();
    execute_deferred_command_lists(&mut *immediate, &mut contexts)
}

fn native<T>(result: anyhow::Result<T>) -> Result<T, DispatchError> {
    result.map_err(DispatchError::NativeCallFailure)
}

