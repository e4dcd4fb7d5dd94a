//! Types for the shaderforge C API.
use crate::error::ShaderforgeError;
use shaderforge::runtime::{ProcessedShader, ShaderPack};
use std::ffi::{c_char, c_void};
use std::ptr::NonNull;

/// An opaque handle to a shader pack.
pub type shaderforge_pack_t = Option<NonNull<ShaderPack>>;

/// An opaque handle to a processed shader.
pub type shaderforge_shader_t = Option<NonNull<ProcessedShader>>;

/// A handle to a shaderforge error. A null handle means the call succeeded.
pub type shaderforge_error_t = Option<NonNull<ShaderforgeError>>;

/// Compiles the generated source of one stage into SPIR-V.
///
/// The callback follows the query-length-then-fill convention: it is called once with a null
/// `binary` to write the length of the binary in words to `len`, then again with a buffer of
/// that length to fill. Returns false if the source failed to compile.
pub type shaderforge_compile_fn = unsafe extern "C" fn(
    user_data: *mut c_void,
    stage: u32,
    source: *const c_char,
    binary: *mut u32,
    len: *mut usize,
) -> bool;

/// A compiler supplied by the caller.
///
/// The callback may be invoked from several threads at once.
#[repr(C)]
pub struct shaderforge_compiler_t {
    pub compile: Option<shaderforge_compile_fn>,
    pub user_data: *mut c_void,
}

/// Options for loading a shader pack.
#[repr(C)]
pub struct shaderforge_pack_options_t {
    /// Generate and compile the stages of a shader concurrently.
    pub parallel: bool,
    /// Keep compiled binaries in the persistent store.
    pub persistent_cache: bool,
}

/// A binding of a descriptor set layout.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default)]
pub struct shaderforge_binding_t {
    pub binding: u32,
    /// The descriptor kind, matching `VkDescriptorType`.
    pub kind: u32,
    /// The number of descriptors. Unbounded arrays report 0.
    pub count: u32,
    /// The stages using the binding, matching `VkShaderStageFlags`.
    pub stages: u32,
    /// Bit 0 is set for reads, bit 1 for writes.
    pub access: u32,
}

/// A push-constant range.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default)]
pub struct shaderforge_push_range_t {
    pub stages: u32,
    pub offset: u32,
    pub size: u32,
}

/// A vertex input attribute.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default)]
pub struct shaderforge_attribute_t {
    pub location: u32,
    pub binding: u32,
    /// The attribute format, matching `VkFormat`.
    pub format: u32,
    pub offset: u32,
}

/// A specialization constant with its default value.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default)]
pub struct shaderforge_spec_constant_t {
    pub id: u32,
    /// 0 bool, 1 int32, 2 uint32, 3 int64, 4 uint64, 5 float32, 6 float64.
    pub kind: u32,
    /// The default value as raw bits, zero-extended to 64 bits.
    pub value: u64,
}
