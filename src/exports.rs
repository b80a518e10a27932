//! Platform-neutral C exports.

use crate::{
    error::DispatchError,
    interop::{export, InteropBool},
    pipeline::Viewport,
    shader::ShaderLibrary,
};

use log::debug;

/// Installs the `RUST_LOG`-configured logger. Calling it again is harmless.
#[no_mangle]
pub unsafe extern "C" fn rcq_init_logging(failure_reason: *mut u16) -> InteropBool {
    export("rcq_init_logging", failure_reason, || {
        if pretty_env_logger::try_init().is_err() {
            debug!("Logger was already initialized");
        }
        Ok::<_, DispatchError>(())
    })
}

/// Allocates a zero-sized viewport with depth range 0.0 to 1.0.
#[no_mangle]
pub unsafe extern "C" fn rcq_create_viewport(
    failure_reason: *mut u16,
    out_viewport: *mut *mut Viewport,
) -> InteropBool {
    export("rcq_create_viewport", failure_reason, || -> Result<(), DispatchError> {
        let out_viewport = out_viewport
            .as_mut()
            .ok_or_else(|| DispatchError::invalid("Viewport output pointer must not be null."))?;
        *out_viewport = Box::into_raw(Box::new(Viewport::new((0, 0))));
        Ok(())
    })
}

#[no_mangle]
pub unsafe extern "C" fn rcq_alter_viewport(
    failure_reason: *mut u16,
    viewport: *mut Viewport,
    top_left_x: u32,
    top_left_y: u32,
    width: u32,
    height: u32,
) -> InteropBool {
    export("rcq_alter_viewport", failure_reason, || -> Result<(), DispatchError> {
        let viewport = viewport
            .as_mut()
            .ok_or_else(|| DispatchError::invalid("Viewport pointer must not be null."))?;
        viewport.top_left_x = top_left_x as f32;
        viewport.top_left_y = top_left_y as f32;
        viewport.width = width as f32;
        viewport.height = height as f32;
        Ok(())
    })
}

/// Frees a viewport from [`rcq_create_viewport`].
#[no_mangle]
pub unsafe extern "C" fn rcq_destroy_viewport(
    failure_reason: *mut u16,
    viewport: *mut Viewport,
) -> InteropBool {
    export("rcq_destroy_viewport", failure_reason, || {
        if viewport.is_null() {
            return Err(DispatchError::invalid("Viewport pointer must not be null."));
        }
        drop(Box::from_raw(viewport));
        Ok(())
    })
}

#[no_mangle]
pub unsafe extern "C" fn rcq_create_shader_library(
    failure_reason: *mut u16,
    out_library: *mut *mut ShaderLibrary,
) -> InteropBool {
    export("rcq_create_shader_library", failure_reason, || -> Result<(), DispatchError> {
        let out_library = out_library.as_mut().ok_or_else(|| {
            DispatchError::invalid("Shader library output pointer must not be null.")
        })?;
        *out_library = Box::into_raw(Box::new(ShaderLibrary::new()));
        Ok(())
    })
}

/// Frees a library and every blob still registered in it.
#[no_mangle]
pub unsafe extern "C" fn rcq_destroy_shader_library(
    failure_reason: *mut u16,
    library: *mut ShaderLibrary,
) -> InteropBool {
    export("rcq_destroy_shader_library", failure_reason, || {
        if library.is_null() {
            return Err(DispatchError::invalid(
                "Shader library pointer must not be null.",
            ));
        }
        let library = Box::from_raw(library);
        debug!("Destroying shader library with {} blobs", library.len());
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        interop::{INTEROP_FALSE, INTEROP_TRUE, MAX_FAILURE_REASON_LENGTH},
        pipeline::Handle,
    };

    use std::ptr::null_mut;

    #[test]
    fn viewport_lifecycle() {
        let mut reason = [0u16; MAX_FAILURE_REASON_LENGTH + 1];
        let mut viewport = null_mut();
        unsafe {
            assert_eq!(rcq_create_viewport(reason.as_mut_ptr(), &mut viewport), INTEROP_TRUE);
            assert_eq!((*viewport).max_depth, 1.0);

            assert_eq!(
                rcq_alter_viewport(reason.as_mut_ptr(), viewport, 10, 20, 640, 480),
                INTEROP_TRUE
            );
            assert_eq!(
                *viewport,
                Viewport {
                    top_left_x: 10.0,
                    top_left_y: 20.0,
                    width: 640.0,
                    height: 480.0,
                    min_depth: 0.0,
                    max_depth: 1.0,
                }
            );

            assert_eq!(rcq_destroy_viewport(reason.as_mut_ptr(), viewport), INTEROP_TRUE);
        }
    }

    #[test]
    fn null_viewport_reports_failure() {
        let mut reason = [0u16; MAX_FAILURE_REASON_LENGTH + 1];
        let result = unsafe { rcq_alter_viewport(reason.as_mut_ptr(), null_mut(), 0, 0, 1, 1) };
        assert_eq!(result, INTEROP_FALSE);

        let end = reason.iter().position(|&u| u == 0).unwrap();
        assert_eq!(
            String::from_utf16_lossy(&reason[..end]),
            "Viewport pointer must not be null."
        );
    }

    #[test]
    fn shader_library_lifecycle() {
        let mut reason = [0u16; MAX_FAILURE_REASON_LENGTH + 1];
        let mut library = null_mut();
        unsafe {
            assert_eq!(
                rcq_create_shader_library(reason.as_mut_ptr(), &mut library),
                INTEROP_TRUE
            );
            (*library).register(Handle(0x10), vec![0u8; 4]).unwrap();
            assert_eq!(
                rcq_destroy_shader_library(reason.as_mut_ptr(), library),
                INTEROP_TRUE
            );
        }
    }

    #[test]
    fn logging_can_be_initialized_twice() {
        unsafe {
            assert_eq!(rcq_init_logging(null_mut()), INTEROP_TRUE);
            assert_eq!(rcq_init_logging(null_mut()), INTEROP_TRUE);
        }
    }
}
