//! Error handling for the shaderforge C API.
use crate::ctypes::shaderforge_error_t;
use crate::ffi::{copy_str, extern_fn};
use shaderforge::runtime::StageError;
use shaderforge::{ErrorKind, Reportable};
use std::any::Any;
use std::ffi::c_char;
use std::mem::MaybeUninit;
use std::ptr::NonNull;
use thiserror::Error;

/// Error type for the shaderforge C API.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ShaderforgeError {
    #[error("the parameter `{0}` was null or invalid")]
    InvalidParameter(&'static str),
    #[error("the string was not valid UTF-8")]
    InvalidString(#[from] std::str::Utf8Error),
    #[error("the output buffer holds {capacity} elements but {needed} are required")]
    BufferTooSmall { needed: usize, capacity: usize },
    #[error("the requested item does not exist")]
    NotFound,
    #[error("there was an error processing the shader")]
    StageError(#[from] StageError),
    #[error("there was an unknown error")]
    UnknownError(Box<dyn Any + Send + 'static>),
}

/// Error codes returned by [`shaderforge_error_errno`] for errors raised by the C API itself.
///
/// Errors raised by the pipeline report the numeric code of their [`ErrorKind`] instead.
#[repr(i32)]
pub enum SHADERFORGE_ERRNO {
    UNKNOWN_ERROR = 0,
    INVALID_PARAMETER = 1,
    INVALID_STRING = 2,
    BUFFER_TOO_SMALL = 3,
    NOT_FOUND = 4,
}

impl ShaderforgeError {
    pub(crate) const fn ok() -> shaderforge_error_t {
        None
    }

    pub(crate) fn panic(panic: Box<dyn Any + Send + 'static>) -> shaderforge_error_t {
        ShaderforgeError::UnknownError(panic).export()
    }

    pub(crate) fn export(self) -> shaderforge_error_t {
        NonNull::new(Box::into_raw(Box::new(self)))
    }

    /// The error code of this error.
    pub fn errno(&self) -> i32 {
        match self {
            ShaderforgeError::UnknownError(_) => SHADERFORGE_ERRNO::UNKNOWN_ERROR as i32,
            ShaderforgeError::InvalidParameter(_) => SHADERFORGE_ERRNO::INVALID_PARAMETER as i32,
            ShaderforgeError::InvalidString(_) => SHADERFORGE_ERRNO::INVALID_STRING as i32,
            ShaderforgeError::BufferTooSmall { .. } => SHADERFORGE_ERRNO::BUFFER_TOO_SMALL as i32,
            ShaderforgeError::NotFound => SHADERFORGE_ERRNO::NOT_FOUND as i32,
            ShaderforgeError::StageError(error) => error.kind().code() as i32,
        }
    }

    /// The pipeline error kind, if the error was raised by the pipeline.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ShaderforgeError::StageError(StageError::Aborted { diagnostic, .. }) => {
                Some(diagnostic.kind)
            }
            ShaderforgeError::StageError(error) => Some(error.kind()),
            _ => None,
        }
    }

    fn message(&self) -> String {
        match self {
            ShaderforgeError::StageError(error) => {
                let mut message = error.to_string();
                let mut source = std::error::Error::source(error);
                while let Some(cause) = source {
                    message.push_str(": ");
                    message.push_str(&cause.to_string());
                    source = cause.source();
                }
                message
            }
            ShaderforgeError::UnknownError(panic) => match panic.downcast_ref::<&str>() {
                Some(message) => format!("{self}: {message}"),
                None => match panic.downcast_ref::<String>() {
                    Some(message) => format!("{self}: {message}"),
                    None => self.to_string(),
                },
            },
            _ => self.to_string(),
        }
    }
}

macro_rules! assert_non_null {
    ($value:ident) => {
        if $value.is_null() {
            return $crate::error::ShaderforgeError::InvalidParameter(stringify!($value)).export();
        }
    };
    (noexport $value:ident) => {
        if $value.is_null() {
            return Err($crate::error::ShaderforgeError::InvalidParameter(
                stringify!($value),
            ));
        }
    };
}

macro_rules! assert_some_ptr {
    ($value:ident) => {
        let Some($value) = $value.as_ref() else {
            return Err($crate::error::ShaderforgeError::InvalidParameter(
                stringify!($value),
            ));
        };
        let $value = unsafe { $value.as_ref() };
    };
}

pub(crate) use assert_non_null;
pub(crate) use assert_some_ptr;

/// Get the error code corresponding to this error object.
///
/// Errors raised by the pipeline return the numeric code of their error kind, which is always
/// at least 1000. Errors raised by the C API return a `SHADERFORGE_ERRNO` value.
///
/// ## Safety
///   - `error` must be valid and initialized.
#[no_mangle]
pub unsafe extern "C" fn shaderforge_error_errno(error: shaderforge_error_t) -> i32 {
    let Some(error) = error else {
        return SHADERFORGE_ERRNO::UNKNOWN_ERROR as i32;
    };
    unsafe { error.as_ref().errno() }
}

/// Get the error kind of the diagnostic that aborted processing, or 0.
///
/// ## Safety
///   - `error` must be valid and initialized.
#[no_mangle]
pub unsafe extern "C" fn shaderforge_error_kind(error: shaderforge_error_t) -> u32 {
    let Some(error) = error else {
        return 0;
    };
    unsafe { error.as_ref() }
        .kind()
        .map_or(0, |kind| kind.code())
}

extern_fn! {
    /// Write the error message, including its terminating NUL, into `out`.
    ///
    /// Call with a null `out` to query the required length in `len`. When `out` is non-null,
    /// `len` must hold its capacity on entry.
    ///
    /// ## Safety
    ///   - `error` must be valid and initialized.
    ///   - `out` must be null or valid for `*len` writes.
    ///   - `len` must be non-null.
    fn shaderforge_error_write(
        error: shaderforge_error_t,
        out: *mut c_char,
        len: *mut usize
    ) {
        assert_some_ptr!(error);
        assert_non_null!(noexport len);
        unsafe { copy_str(&error.message(), out, len)? }
    }
}

/// Frees a shaderforge error and sets the handle to null.
///
/// ## Safety
///   - `error` must be null or point to a handle returned by a shaderforge function.
#[no_mangle]
pub unsafe extern "C" fn shaderforge_error_free(error: *mut MaybeUninit<shaderforge_error_t>) -> i32 {
    if error.is_null() {
        return SHADERFORGE_ERRNO::INVALID_PARAMETER as i32;
    }

    let error = unsafe { &mut *error };
    let handle = unsafe { std::mem::replace(error, MaybeUninit::new(None)).assume_init() };
    if let Some(handle) = handle {
        drop(unsafe { Box::from_raw(handle.as_ptr()) });
    }
    0
}
