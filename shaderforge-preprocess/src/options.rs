use std::path::PathBuf;

/// Environment variable setting the library root for `#include <...>` directives.
pub const LIBRARY_PATH_ENV: &str = "SHADERFORGE_LIBRARY_PATH";

/// Options for source generation.
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// The root that `#include <...>` directives are resolved against.
    pub library_root: Option<PathBuf>,
    /// The GLSL version emitted when the body does not declare one.
    pub default_version: u32,
    /// Extensions enabled in every generated stage.
    pub default_extensions: Vec<String>,
    /// Emit `#line` directives so compiler diagnostics point into the body and include files.
    pub line_directives: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        GeneratorOptions {
            library_root: None,
            default_version: 450,
            default_extensions: Vec::new(),
            line_directives: false,
        }
    }
}

impl GeneratorOptions {
    /// Read options from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let library_root = std::env::var_os(LIBRARY_PATH_ENV)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);
        GeneratorOptions {
            library_root,
            ..Default::default()
        }
    }
}
