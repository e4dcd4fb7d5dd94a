use shaderforge_cache::CacheError;
use shaderforge_common::{DescriptorKind, ErrorKind, Reportable};
use std::path::PathBuf;
use thiserror::Error;

/// Error type for source generation.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PreprocessError {
    /// The body file of the stage does not exist.
    #[error("the body file {0:?} does not exist")]
    MissingBody(PathBuf),
    /// An included file could not be found on any search path.
    #[error("the include `{name}` in {from:?} was not found")]
    MissingInclude { name: String, from: PathBuf },
    /// Includes nested deeper than the allowed depth.
    #[error("includes nested too deeply in {0:?}")]
    IncludeDepthExceeded(PathBuf),
    /// A `use_resource_block` directive names a group absent from the catalog.
    #[error("the resource group `{0}` was not found")]
    ResourceGroupNotFound(String),
    /// A resource of a kind that cannot be declared in a resource block.
    #[error("the resource `{group}.{resource}` has kind {kind} which cannot be declared")]
    InvalidDescriptorKind {
        group: String,
        resource: String,
        kind: DescriptorKind,
    },
    /// A recognized directive could not be parsed.
    #[error("malformed directive `{0}`")]
    MalformedDirective(String),
    /// An interface override region was opened but never closed, or closed without being opened.
    #[error("unterminated interface override region")]
    UnterminatedInterfaceOverride,
    /// A file could not be read.
    #[error("cache or filesystem error")]
    Cache(#[from] CacheError),
}

impl Reportable for PreprocessError {
    fn kind(&self) -> ErrorKind {
        match self {
            PreprocessError::MissingBody(_) => ErrorKind::MissingBody,
            PreprocessError::MissingInclude { .. } => ErrorKind::MissingInclude,
            PreprocessError::IncludeDepthExceeded(_) => ErrorKind::IncludeDepthExceeded,
            PreprocessError::ResourceGroupNotFound(_) => ErrorKind::ResourceGroupNotFound,
            PreprocessError::InvalidDescriptorKind { .. } => ErrorKind::InvalidDescriptorKind,
            PreprocessError::MalformedDirective(_) => ErrorKind::MalformedDirective,
            PreprocessError::UnterminatedInterfaceOverride => {
                ErrorKind::UnterminatedInterfaceOverride
            }
            PreprocessError::Cache(e) => e.kind(),
        }
    }
}
