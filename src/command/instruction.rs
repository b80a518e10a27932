//! Instruction tags shared with the managed encoder.

use std::{convert::TryFrom, fmt};

/// Selects the pipeline operation of a render command.
///
/// The discriminants are the wire values and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum Instruction {
    NoOperation = 0,
    SetPrimitiveTopology = 1,
    SetInputLayout = 2,
    SetVertexBuffers = 3,
    SetInstanceBuffer = 4,
    SetIndexBuffer = 5,
    SetRenderTargets = 6,
    CBDiscardWrite = 7,
    VSSetCBuffers = 8,
    VSSetSamplers = 9,
    VSSetResources = 10,
    VSSetShader = 11,
    SetRSState = 12,
    SetDSState = 13,
    SetBlendState = 14,
    SetViewport = 15,
    FSSetCBuffers = 16,
    FSSetSamplers = 17,
    FSSetResources = 18,
    FSSetShader = 19,
    DrawIndexedInstanced = 20,
    Draw = 21,
    ClearRenderTarget = 22,
    ClearDepthStencil = 23,
    SwapChainPresent = 24,
    FinishCommandList = 25,
    BufferWrite = 26,
}

impl Instruction {
    /// Every instruction, in wire order.
    pub const ALL: [Instruction; 27] = [
        Instruction::NoOperation,
        Instruction::SetPrimitiveTopology,
        Instruction::SetInputLayout,
        Instruction::SetVertexBuffers,
        Instruction::SetInstanceBuffer,
        Instruction::SetIndexBuffer,
        Instruction::SetRenderTargets,
        Instruction::CBDiscardWrite,
        Instruction::VSSetCBuffers,
        Instruction::VSSetSamplers,
        Instruction::VSSetResources,
        Instruction::VSSetShader,
        Instruction::SetRSState,
        Instruction::SetDSState,
        Instruction::SetBlendState,
        Instruction::SetViewport,
        Instruction::FSSetCBuffers,
        Instruction::FSSetSamplers,
        Instruction::FSSetResources,
        Instruction::FSSetShader,
        Instruction::DrawIndexedInstanced,
        Instruction::Draw,
        Instruction::ClearRenderTarget,
        Instruction::ClearDepthStencil,
        Instruction::SwapChainPresent,
        Instruction::FinishCommandList,
        Instruction::BufferWrite,
    ];

    /// Returns the wire value.
    pub const fn to_raw(self) -> u64 {
        self as u64
    }
}

impl TryFrom<u64> for Instruction {
    type Error = u64;

    fn try_from(value: u64) -> Result<Instruction, u64> {
        if value < Instruction::ALL.len() as u64 {
            Ok(Instruction::ALL[value as usize])
        } else {
            Err(value)
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
