use crate::error::ShaderforgeError;
use std::ffi::c_char;

macro_rules! ffi_body {
    ($body:block) => {
        {
            let result = ::std::panic::catch_unwind(::std::panic::AssertUnwindSafe(
                || -> Result<(), $crate::error::ShaderforgeError> {
                    $body;
                    Ok(())
                },
            ));

            match result {
                Ok(Ok(())) => $crate::error::ShaderforgeError::ok(),
                Ok(Err(e)) => e.export(),
                Err(panic) => $crate::error::ShaderforgeError::panic(panic),
            }
        }
    };
    (|$($ref_capture:ident),*|; mut |$($mut_capture:ident),*| $body:block) => {
        {
            $($crate::error::assert_non_null!($ref_capture);)*
            $(let $ref_capture = unsafe { &*$ref_capture };)*
            $($crate::error::assert_non_null!($mut_capture);)*
            $(let $mut_capture = unsafe { &mut *$mut_capture };)*
            $crate::ffi::ffi_body!($body)
        }
    };
    (mut |$($mut_capture:ident),*| $body:block) => {
        {
            $($crate::error::assert_non_null!($mut_capture);)*
            $(let $mut_capture = unsafe { &mut *$mut_capture };)*
            $crate::ffi::ffi_body!($body)
        }
    };
    (|$($ref_capture:ident),*| $body:block) => {
        {
            $($crate::error::assert_non_null!($ref_capture);)*
            $(let $ref_capture = unsafe { &*$ref_capture };)*
            $crate::ffi::ffi_body!($body)
        }
    };
}

macro_rules! extern_fn {
    ($(#[$($attrss:tt)*])* fn $func_name:ident ($($arg_name:ident : $arg_ty:ty),* $(,)?) $body:block) => {
        ::paste::paste! {
            /// Function pointer definition for
            #[doc = ::std::stringify!($func_name)]
            pub type [<PFN_ $func_name>] = unsafe extern "C" fn($($arg_name: $arg_ty,)*) -> $crate::ctypes::shaderforge_error_t;
        }

        #[no_mangle]
        $(#[$($attrss)*])*
        pub unsafe extern "C" fn $func_name($($arg_name: $arg_ty,)*) -> $crate::ctypes::shaderforge_error_t {
            $crate::ffi::ffi_body!($body)
        }
    };

    ($(#[$($attrss:tt)*])* fn $func_name:ident ($($arg_name:ident : $arg_ty:ty),* $(,)?) mut |$($mut_capture:ident),*| $body:block) => {
        ::paste::paste! {
            /// Function pointer definition for
            #[doc = ::std::stringify!($func_name)]
            pub type [<PFN_ $func_name>] = unsafe extern "C" fn($($arg_name: $arg_ty,)*) -> $crate::ctypes::shaderforge_error_t;
        }

        #[no_mangle]
        $(#[$($attrss)*])*
        pub unsafe extern "C" fn $func_name($($arg_name: $arg_ty,)*) -> $crate::ctypes::shaderforge_error_t {
            $crate::ffi::ffi_body!(mut |$($mut_capture),*| $body)
        }
    };

    ($(#[$($attrss:tt)*])* fn $func_name:ident ($($arg_name:ident : $arg_ty:ty),* $(,)?) |$($ref_capture:ident),*| $body:block) => {
        ::paste::paste! {
            /// Function pointer definition for
            #[doc = ::std::stringify!($func_name)]
            pub type [<PFN_ $func_name>] = unsafe extern "C" fn($($arg_name: $arg_ty,)*) -> $crate::ctypes::shaderforge_error_t;
        }

        #[no_mangle]
        $(#[$($attrss)*])*
        pub unsafe extern "C" fn $func_name($($arg_name: $arg_ty,)*) -> $crate::ctypes::shaderforge_error_t {
            $crate::ffi::ffi_body!(|$($ref_capture),*| $body)
        }
    };
}

pub(crate) use extern_fn;
pub(crate) use ffi_body;

/// Copy `items` into `out` using the query-length-then-fill convention.
///
/// `len` always receives the number of items available. When `out` is non-null, `*len` holds
/// its capacity on entry, and a capacity smaller than the item count is an error.
///
/// ## Safety
/// `len` must be valid for reads and writes, and `out` must be null or valid for `*len` writes.
pub(crate) unsafe fn copy_items<T: Copy>(
    items: &[T],
    out: *mut T,
    len: *mut usize,
) -> Result<(), ShaderforgeError> {
    if !out.is_null() {
        let capacity = unsafe { len.read() };
        if capacity < items.len() {
            return Err(ShaderforgeError::BufferTooSmall {
                needed: items.len(),
                capacity,
            });
        }
        unsafe { std::ptr::copy_nonoverlapping(items.as_ptr(), out, items.len()) };
    }
    unsafe { len.write(items.len()) };
    Ok(())
}

/// Copy `text` and a terminating NUL into `out` using the query-length-then-fill convention.
///
/// ## Safety
/// Same as [`copy_items`].
pub(crate) unsafe fn copy_str(
    text: &str,
    out: *mut c_char,
    len: *mut usize,
) -> Result<(), ShaderforgeError> {
    let mut bytes: Vec<c_char> = text.bytes().map(|b| b as c_char).collect();
    bytes.push(0);
    unsafe { copy_items(&bytes, out, len) }
}
