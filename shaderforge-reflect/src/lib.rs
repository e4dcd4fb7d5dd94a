//! SPIR-V reflection and the compiler boundary for shaderforge.
//!
//! Generated stage sources are handed to a [`ShaderCompiler`](crate::front::ShaderCompiler),
//! which produces SPIR-V. The binary of each stage is then reflected with
//! [`reflect_stage`](crate::reflect::reflect_stage), recovering descriptor usages, the
//! push-constant block, stage interfaces and specialization constants, and checking that every
//! catalog resource landed at the set and binding it was generated with.
//!
//! The shaderc compiler is available under the `shaderc` feature.

/// Error types.
pub mod error;
/// Shader compilers.
pub mod front;
/// SPIR-V reflection.
pub mod reflect;

pub use error::{CompileError, ReflectError};
pub use front::ShaderCompiler;
pub use reflect::{disassemble, reflect_stage, ReflectContext};
