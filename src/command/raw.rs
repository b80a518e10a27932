//! The flat interop record.

use super::Instruction;

use std::convert::TryFrom;

/// One render command as laid out across the interop boundary.
///
/// 32 bytes: the instruction tag followed by three opaque argument slots whose
/// meaning depends on the tag. Byte-packed so any caller packing is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(C, packed)]
pub struct RawCommand {
    pub instruction: u64,
    pub arg1: u64,
    pub arg2: u64,
    pub arg3: u64,
}

impl RawCommand {
    pub const fn new(instruction: Instruction, arg1: u64, arg2: u64, arg3: u64) -> RawCommand {
        RawCommand {
            instruction: instruction as u64,
            arg1,
            arg2,
            arg3,
        }
    }

    pub const fn no_operation() -> RawCommand {
        RawCommand::new(Instruction::NoOperation, 0, 0, 0)
    }

    /// Decodes the tag, returning the raw value when it is unknown.
    pub fn instruction(&self) -> Result<Instruction, u64> {
        Instruction::try_from(self.instruction)
    }
}

/// Packs two `u32`s into one slot, `first` in the low-order half.
pub const fn pack_u32_pair(first: u32, second: u32) -> u64 {
    (first as u64) | ((second as u64) << 32)
}

/// Inverse of [`pack_u32_pair`].
pub const fn unpack_u32_pair(slot: u64) -> (u32, u32) {
    (slot as u32, (slot >> 32) as u32)
}
