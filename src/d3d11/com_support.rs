//! Safe operation of Windows COM.

use crate::{error::HresultError, pipeline::Handle};

use std::{ops::Deref, ptr::NonNull};

use anyhow::Result;
use winapi::{
    shared::winerror::{HRESULT, SUCCEEDED},
    um::unknwnbase::IUnknown,
    Interface,
};

/// Owns one reference to a COM object.
#[derive(Debug)]
pub struct ComPtr<T: Interface>(NonNull<T>);

impl<T: Interface> ComPtr<T> {
    /// Adopts a reference. `None` for null.
    pub fn new(pointer: *mut T) -> Option<ComPtr<T>> {
        NonNull::new(pointer).map(ComPtr)
    }

    /// Adopts the reference behind a caller-supplied handle.
    pub fn from_handle(handle: Handle) -> Option<ComPtr<T>> {
        ComPtr::new(handle.as_ptr())
    }

    /// Returns the raw pointer.
    /// AddRef() won't be called internally.
    pub fn as_ptr(&self) -> *mut T {
        self.0.as_ptr()
    }

    /// Gives up ownership without calling Release().
    pub fn into_handle(self) -> Handle {
        let handle = Handle::from_ptr(self.0.as_ptr());
        std::mem::forget(self);
        handle
    }
}

impl<T: Interface> Deref for ComPtr<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        unsafe { self.0.as_ref() }
    }
}

impl<T: Interface> Drop for ComPtr<T> {
    fn drop(&mut self) {
        unsafe {
            let unknown = &*(self.0.as_ptr() as *mut IUnknown);
            unknown.Release();
        }
    }
}

/// The extension trait for `HRESULT` type.
pub trait HresultErrorExt {
    fn err(self) -> Result<()>;
}

impl HresultErrorExt for HRESULT {
    fn err(self) -> Result<()> {
        if SUCCEEDED(self) {
            Ok(())
        } else {
            Err(HresultError(self as u32).into())
        }
    }
}
