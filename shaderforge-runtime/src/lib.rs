//! Binding collation and stage processing for shaderforge.
//!
//! A [`ShaderPack`] drives every stage of a shader group through generation, compilation and
//! reflection, running the stages concurrently and folding each reflected stage into the
//! [`Shader`] tables: descriptor sets with stage masks merged per binding, push-constant blocks
//! stacked end to end, stage attributes and specialization constants.
//!
//! The tables can be read back as pipeline-layout records or as a JSON binding dump.

/// Error types.
pub mod error;
/// Pipeline-layout facing records.
pub mod layout;
/// Stage drivers.
pub mod pack;
/// Single-stage processing.
pub mod processor;
/// Collated shader tables.
pub mod shader;

mod dump;

pub use error::{CollateError, StageError};
pub use pack::{PackOptions, ProcessedShader, ShaderPack};
pub use processor::{CompiledStage, StageProcessor};
pub use shader::{DescriptorSetInfo, Shader};
