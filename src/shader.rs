//! Vertex shader bytecode registry and input element marshaling.

use crate::{
    error::DispatchError,
    interop::{from_interop_bool, read_interop_string, InteropBool},
    pipeline::Handle,
};

use std::{
    collections::HashMap,
    ffi::CString,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use log::debug;

/// Owns the bytecode of every loaded vertex shader, keyed by shader handle.
///
/// Input layouts are validated against this bytecode, so it must outlive the
/// shader objects themselves.
#[derive(Debug, Default)]
pub struct ShaderLibrary {
    blobs: Mutex<HashMap<Handle, Arc<[u8]>>>,
}

impl ShaderLibrary {
    pub fn new() -> ShaderLibrary {
        ShaderLibrary::default()
    }

    /// Stores `bytecode` for `shader`, replacing any previous entry.
    pub fn register(&self, shader: Handle, bytecode: impl Into<Arc<[u8]>>) -> Result<(), DispatchError> {
        if shader.is_null() {
            return Err(DispatchError::invalid("Shader pointer must not be null."));
        }

        let bytecode = bytecode.into();
        debug!("Registering {} bytes of bytecode for vertex shader {}", bytecode.len(), shader);
        self.lock().insert(shader, bytecode);
        Ok(())
    }

    /// Forgets the bytecode of `shader`, returning it if it was known.
    pub fn unregister(&self, shader: Handle) -> Option<Arc<[u8]>> {
        self.lock().remove(&shader)
    }

    /// Returns the bytecode of `shader`.
    pub fn blob(&self, shader: Handle) -> Result<Arc<[u8]>, DispatchError> {
        self.lock().get(&shader).cloned().ok_or_else(|| {
            DispatchError::invalid(format!(
                "Could not find shader binary for vertex shader {}.",
                shader
            ))
        })
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Handle, Arc<[u8]>>> {
        // Every mutation is a single map call, so a poisoned map is still consistent.
        self.blobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An input element as described by the caller.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct InputElementDesc {
    /// Null-terminated UTF-16.
    pub semantic_name: *const u16,
    pub semantic_index: u32,
    /// A `DXGI_FORMAT` value.
    pub element_format: u32,
    pub input_slot: u32,
    pub is_per_vertex_data: InteropBool,
}

/// An input element ready to be handed to the graphics API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputElement {
    pub semantic_name: CString,
    pub semantic_index: u32,
    pub format: u32,
    pub input_slot: u32,
    pub per_vertex: bool,
}

impl InputElement {
    /// Converts a caller record.
    ///
    /// # Safety
    /// `desc.semantic_name` must be null or a null-terminated UTF-16 string.
    pub unsafe fn from_desc(desc: &InputElementDesc) -> Result<InputElement, DispatchError> {
        let name = read_interop_string(desc.semantic_name, "Semantic name")?;
        let semantic_name = CString::new(name)
            .map_err(|_| DispatchError::invalid("Semantic name contains a null character."))?;

        Ok(InputElement {
            semantic_name,
            semantic_index: desc.semantic_index,
            format: desc.element_format,
            input_slot: desc.input_slot,
            per_vertex: from_interop_bool(desc.is_per_vertex_data),
        })
    }

    /// 0 for per-vertex data, 1 for per-instance data.
    pub fn instance_step_rate(&self) -> u32 {
        if self.per_vertex {
            0
        } else {
            1
        }
    }
}

/// Converts `count` caller records starting at `descs`.
///
/// # Safety
/// `descs` must be null or point to `count` records satisfying
/// [`InputElement::from_desc`].
pub unsafe fn input_elements_from_raw(
    descs: *const InputElementDesc,
    count: u32,
) -> Result<Vec<InputElement>, DispatchError> {
    if count == 0 {
        return Ok(vec![]);
    }
    if descs.is_null() {
        return Err(DispatchError::invalid(
            "Input element description array pointer must not be null.",
        ));
    }

    std::slice::from_raw_parts(descs, count as usize)
        .iter()
        .map(|desc| InputElement::from_desc(desc))
        .collect()
}
