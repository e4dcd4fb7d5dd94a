use shaderforge_cache::CacheError;
use shaderforge_catalog::CatalogError;
use shaderforge_common::{DescriptorKind, Diagnostic, ErrorKind, Reportable, ShaderStageIdentity};
use shaderforge_preprocess::PreprocessError;
use shaderforge_reflect::{CompileError, ReflectError};
use thiserror::Error;

/// Error type for folding a stage into the tables of a shader.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CollateError {
    /// The stage was already folded into the shader.
    #[error("stage {0} was already parsed")]
    StageAlreadyParsed(ShaderStageIdentity),

    /// Two stages use the same set and binding with different descriptor kinds.
    #[error("set {set} binding {binding} is used as {first} and as {second}")]
    DescriptorConflict {
        set: u32,
        binding: u32,
        first: DescriptorKind,
        second: DescriptorKind,
    },

    /// The stacked push-constant blocks end past `u32::MAX`.
    #[error("the push-constant block `{0}` does not fit in 32 bits when stacked")]
    PushConstantOverflow(String),

    #[error("reflection error")]
    Reflect(#[from] ReflectError),
}

impl Reportable for CollateError {
    fn kind(&self) -> ErrorKind {
        match self {
            CollateError::StageAlreadyParsed(_) => ErrorKind::StageAlreadyParsed,
            CollateError::DescriptorConflict { .. } => ErrorKind::DescriptorConflict,
            CollateError::PushConstantOverflow(_) => ErrorKind::PushConstantOverflow,
            CollateError::Reflect(error) => error.kind(),
        }
    }
}

/// Error type for processing the stages of a shader.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StageError {
    /// The catalog has no shader group of that name.
    #[error("the shader group `{0}` was not found")]
    StageNotFound(String),

    /// A stage reported an error that stops the whole pipeline.
    #[error("processing `{shader}` was aborted: {diagnostic}")]
    Aborted {
        shader: String,
        diagnostic: Diagnostic,
    },

    #[error("catalog error")]
    Catalog(#[from] CatalogError),

    #[error("source generation error")]
    Preprocess(#[from] PreprocessError),

    #[error("compilation error")]
    Compile(#[from] CompileError),

    #[error("reflection error")]
    Reflect(#[from] ReflectError),

    #[error("collation error")]
    Collate(#[from] CollateError),

    #[error("cache error")]
    Cache(#[from] CacheError),
}

impl Reportable for StageError {
    fn kind(&self) -> ErrorKind {
        match self {
            StageError::StageNotFound(_) => ErrorKind::StageNotFound,
            StageError::Aborted { .. } => ErrorKind::StageFailed,
            StageError::Catalog(error) => error.kind(),
            StageError::Preprocess(error) => error.kind(),
            StageError::Compile(error) => error.kind(),
            StageError::Reflect(error) => error.kind(),
            StageError::Collate(error) => error.kind(),
            StageError::Cache(error) => error.kind(),
        }
    }
}
