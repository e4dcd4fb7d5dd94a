//! The resource catalog consumed by the shaderforge generator and reflector.
//!
//! A catalog holds the resource groups (named sets of buffers, images and samplers with their
//! binding indices and qualifiers) and the shader groups (which body files and stages compose
//! one multi-stage shader). The generator expands resource groups into binding declarations,
//! and the reflector cross-checks compiled binaries against the binding indices recorded here.
//!
//! Catalogs are read from a JSON document with [`ResourceCatalog::load`], or built in memory
//! with [`ResourceCatalog::new`].

mod catalog;
mod error;
mod parse;

pub use catalog::*;
pub use error::*;
