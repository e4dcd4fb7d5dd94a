//! Common types shared across the shaderforge crates.
//!
//! This crate carries the vocabulary every stage of the pipeline agrees on: shader stage
//! bits and identities, descriptor kinds, formats, and the flat error taxonomy together with
//! the [`ErrorSession`](crate::error::ErrorSession) accumulator.

/// Descriptor kinds, access modifiers and image dimensions.
pub mod descriptor;
/// Flat error kinds, diagnostics, and error sessions.
pub mod error;
/// Image, texel and vertex attribute formats.
pub mod format;
/// Shader stages and stage identities.
pub mod stage;

pub use descriptor::{AccessModifier, DescriptorKind, ImageDimension};
pub use error::{Diagnostic, ErrorKind, ErrorSession, Reportable};
pub use format::{Format, ScalarKind};
pub use stage::{ShaderStage, ShaderStageIdentity};

/// Fast hash map for small, non-adversarial keys.
pub type FastHashMap<K, V> =
    std::collections::HashMap<K, V, core::hash::BuildHasherDefault<rustc_hash::FxHasher>>;
