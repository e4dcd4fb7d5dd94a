//! The C API for [shaderforge](https://docs.rs/shaderforge/).
//!
//! ## Usage
//! Rust consumers should use [shaderforge](https://docs.rs/shaderforge/) directly.
//!
//! Most objects are only accessible behind an opaque handle. Every allocated object can be freed
//! with the `free` function **for that specific object type**. Once an object is freed, the
//! handle is set to null.
//!
//! Passing a null pointer into any function that requires a non-null pointer returns an error
//! with code `INVALID_PARAMETER`.
//!
//! All functions have safety invariants labeled `## Safety` that must be upheld. Failure to
//! uphold these invariants results in **immediate undefined behaviour**.
//!
//! ## Arrays and strings
//! Functions that return arrays or strings follow the query-length-then-fill convention. Call
//! the function with a null output buffer to receive the number of elements in `len`, allocate
//! a buffer of that size, then call again with the buffer and its capacity in `len`. Strings
//! are copied with their terminating NUL, which is included in the length.
//!
//! ## Errors
//! Every function returns a `shaderforge_error_t`, which is either a null pointer or a handle to
//! an allocated error object. If the returned error is null, the function succeeded. Otherwise,
//! error information can be read with the `shaderforge_error_` functions, and the error must be
//! freed with `shaderforge_error_free`.
#![allow(non_camel_case_types)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod ctypes;
pub mod error;
mod ffi;
pub mod pack;
pub mod shader;
