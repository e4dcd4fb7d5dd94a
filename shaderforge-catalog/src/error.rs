use shaderforge_common::{ErrorKind, Reportable};
use std::path::PathBuf;
use thiserror::Error;

/// Error type for loading and validating a resource catalog.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The catalog document could not be read.
    #[error("the catalog document {0:?} could not be read")]
    IOError(PathBuf, std::io::Error),
    /// The catalog document was not well formed.
    #[error("the catalog document could not be parsed")]
    ParseError(#[from] serde_json::Error),
    /// The catalog document did not contain a required top-level section.
    #[error("the catalog document is missing the `{0}` section")]
    MissingSection(&'static str),
    /// Two entries share the same name.
    #[error("duplicate {what} `{name}`")]
    DuplicateName { what: &'static str, name: String },
    /// Two resources in the same group share a binding index.
    #[error("resources `{first}` and `{second}` in group `{group}` share binding {binding}")]
    DuplicateBinding {
        group: String,
        binding: u32,
        first: String,
        second: String,
    },
    /// A field held a value that could not be interpreted.
    #[error("invalid value `{value}` for `{field}` in `{owner}`")]
    InvalidValue {
        owner: String,
        field: &'static str,
        value: String,
    },
}

impl Reportable for CatalogError {
    fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::IOError(..) => ErrorKind::CatalogIo,
            CatalogError::ParseError(_) => ErrorKind::CatalogParse,
            CatalogError::MissingSection(_) => ErrorKind::CatalogMissingSection,
            CatalogError::DuplicateName { .. } | CatalogError::DuplicateBinding { .. } => {
                ErrorKind::CatalogDuplicateName
            }
            CatalogError::InvalidValue { .. } => ErrorKind::CatalogInvalidValue,
        }
    }
}
