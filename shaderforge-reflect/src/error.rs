use shaderforge_catalog::ResourceKey;
use shaderforge_common::{ErrorKind, Reportable};
use thiserror::Error;

/// Error type for shader compilation.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CompileError {
    /// The compiler could not be initialized.
    #[error("the shader compiler could not be initialized")]
    Init,

    /// The source failed to compile.
    #[error("compilation of {name} failed: {message}")]
    Failed { name: String, message: String },

    /// Compilation error from shaderc (glslang).
    #[cfg(feature = "shaderc")]
    #[error("shaderc")]
    ShaderCCompileError(#[from] shaderc::Error),

    /// The compiler cannot turn binaries back into source text.
    #[error("the compiler does not support recompiling binaries to text")]
    RecompileUnsupported,
}

impl Reportable for CompileError {
    fn kind(&self) -> ErrorKind {
        match self {
            CompileError::Init => ErrorKind::CompilerInit,
            CompileError::Failed { .. } => ErrorKind::CompilationFailed,
            #[cfg(feature = "shaderc")]
            CompileError::ShaderCCompileError(_) => ErrorKind::CompilationFailed,
            CompileError::RecompileUnsupported => ErrorKind::RecompileUnsupported,
        }
    }
}

/// Error type for shader reflection.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ReflectError {
    /// The binary is not a valid SPIR-V module.
    #[error("invalid SPIR-V binary: {0}")]
    InvalidBinary(String),

    /// A resource variable has a type that is not a descriptor.
    #[error("the resource `{name}` has an invalid descriptor type: {reason}")]
    InvalidDescriptorType { name: String, reason: &'static str },

    /// Two resources of one stage claim the same binding.
    #[error("`{first}` and `{second}` both use set {set} binding {binding}")]
    DuplicateDescriptorType {
        set: u32,
        binding: u32,
        first: String,
        second: String,
    },

    /// A resource variable is missing its set or binding.
    #[error("the resource `{0}` has no descriptor set or binding")]
    InvalidBindingIndex(String),

    /// The reflected binding of a catalog resource differs from the catalog.
    #[error("`{resource}` is declared at set {expected_set} binding {expected_binding} but reflected at set {set} binding {binding}")]
    BindingMismatch {
        resource: ResourceKey,
        expected_set: u32,
        expected_binding: u32,
        set: u32,
        binding: u32,
    },

    /// A vector or matrix specialization constant.
    #[error("the specialization constant `{0}` is not a scalar")]
    UnsupportedSpecConstant(String),

    /// A stage declares more than one push-constant block.
    #[error("push-constant blocks `{first}` and `{second}` are declared in one stage")]
    MultiplePushConstantBlocks { first: String, second: String },
}

impl Reportable for ReflectError {
    fn kind(&self) -> ErrorKind {
        match self {
            ReflectError::InvalidBinary(_) => ErrorKind::InvalidBinary,
            ReflectError::InvalidDescriptorType { .. } => ErrorKind::InvalidDescriptorType,
            ReflectError::DuplicateDescriptorType { .. } => ErrorKind::DuplicateDescriptorType,
            ReflectError::InvalidBindingIndex(_) => ErrorKind::InvalidBindingIndex,
            ReflectError::BindingMismatch { .. } => ErrorKind::BindingMismatch,
            ReflectError::UnsupportedSpecConstant(_) => ErrorKind::UnsupportedSpecConstant,
            ReflectError::MultiplePushConstantBlocks { .. } => {
                ErrorKind::MultiplePushConstantBlocks
            }
        }
    }
}

impl From<rspirv::binary::ParseState> for ReflectError {
    fn from(state: rspirv::binary::ParseState) -> Self {
        ReflectError::InvalidBinary(state.to_string())
    }
}
