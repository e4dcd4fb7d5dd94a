#![forbid(missing_docs)]
//! Shader source generation, SPIR-V reflection and binding collation.
//!
//! shaderforge turns shader body files and a resource catalog into complete stage sources,
//! hands them to a compiler, and reads the compiled SPIR-V back to recover the descriptor
//! bindings, push constants, stage attributes and specialization constants of every stage.
//! The per-stage records are collated into the tables a pipeline layout is built from.
//!
//! ## Usage
//! The core objects are the [`ResourceCatalog`](crate::catalog::ResourceCatalog) and the
//! [`ShaderPack`](crate::runtime::ShaderPack).
//!
//! The basic workflow loads a catalog document, which is used to construct a `ShaderPack`
//! together with a [`ShaderCompiler`](crate::reflect::ShaderCompiler). `ShaderPack::process`
//! then generates, compiles and reflects every stage of a shader group and returns the
//! collated [`Shader`](crate::runtime::Shader).
//!
//! Generated sources and compiled binaries are memoized in a
//! [`SourceCache`](crate::cache::SourceCache), keyed by stage identity and invalidated when a
//! body file changes on disk.
//!
//! ## Features
//! | **Component**          | **`shaderforge` feature** |
//! |------------------------|---------------------------|
//! | Resource catalog       | `catalog`                 |
//! | Source generation      | `preprocess`              |
//! | Source cache           | `cache`                   |
//! | Reflection             | `reflect`                 |
//! | Collation and packs    | `runtime`                 |
//! | shaderc compiler       | `shaderc`                 |

#[cfg(feature = "catalog")]
/// The resource catalog.
///
/// A catalog holds the resource groups expanded into binding declarations and the shader
/// groups that name the body file of every stage.
pub mod catalog {
    pub use shaderforge_catalog::*;
}

#[cfg(feature = "preprocess")]
/// Generation of complete stage sources from body files.
///
/// Body files are expanded with their includes, interface directives, specialization constants
/// and resource blocks before being handed to a compiler.
pub mod preprocess {
    pub use shaderforge_preprocess::*;
}

#[cfg(feature = "cache")]
/// The source cache and the persistent binary store.
pub mod cache {
    pub use shaderforge_cache::*;
}

#[cfg(feature = "reflect")]
/// Shader compilation and reflection.
pub mod reflect {
    pub use shaderforge_reflect::error::*;
    pub use shaderforge_reflect::reflect::semantics;
    pub use shaderforge_reflect::{disassemble, reflect_stage, ReflectContext, ShaderCompiler};

    #[cfg(feature = "shaderc")]
    pub use shaderforge_reflect::front::shaderc::ShadercCompiler;
}

#[cfg(feature = "runtime")]
/// Collation of reflected stages and concurrent stage processing.
pub mod runtime {
    pub use shaderforge_runtime::*;
}

pub use shaderforge_common::{
    AccessModifier, DescriptorKind, Diagnostic, ErrorKind, ErrorSession, Format, ImageDimension,
    Reportable, ScalarKind, ShaderStage, ShaderStageIdentity,
};
