//! Replays render command buffers produced by a managed engine
//! against a Direct3D 11 device context.
//!
//! The managed side encodes pipeline operations into fixed 32-byte
//! [`RawCommand`](command::RawCommand) records. This crate decodes them into
//! [`Command`](command::Command)s and issues the matching calls through a
//! [`Pipeline`](pipeline::Pipeline), in order and without interpretation.

pub mod dispatch;
pub mod error;
pub mod exports;
pub mod interop;
pub mod pipeline;
pub mod shader;

/// Render command encoding, decoding and queueing.
pub mod command {
    mod instruction;
    pub mod queue;
    mod raw;
    mod typed;

    pub use instruction::Instruction;
    pub use queue::{CommandQueue, ReservedSlot};
    pub use raw::{pack_u32_pair, unpack_u32_pair, RawCommand};
    pub use typed::{Command, DrawIndexedInstanced};
}

/// Direct3D 11 backend.
#[cfg(windows)]
pub mod d3d11 {
    mod com_support;
    pub mod context;
    pub mod exports;
    pub mod shader;

    pub use com_support::{ComPtr, HresultErrorExt};
}

/// NULL を生成する。
#[macro_export]
macro_rules! null {
    ($t: ty) => {
        0 as *mut $t
    };
}

/// *mut T から ComPtr<T> に変換する。
/// いずれかに NULL が含まれていた場合 Err でベイルアウトする。
#[macro_export]
macro_rules! comptrize {
    ($($i:ident),* $(,)?) => { $(
        let $i = if let Some(comptr) = $crate::d3d11::ComPtr::new($i) {
            comptr
        } else {
            anyhow::bail!("{} is NULL", stringify!($i));
        };
    )* }
}
