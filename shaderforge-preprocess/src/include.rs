use crate::pragma::parse_include;
use crate::PreprocessError;
use shaderforge_cache::fs::read_text;
use shaderforge_cache::CacheError;
use std::path::{Path, PathBuf};

pub(crate) const GL_GOOGLE_CPP_STYLE_LINE_DIRECTIVE: &str = "GL_GOOGLE_CPP_STYLE_LINE_DIRECTIVE";

/// The maximum nesting depth of includes.
pub const MAX_INCLUDE_DEPTH: usize = 16;

pub(crate) trait SourceOutput {
    fn push_line(&mut self, str: &str);
    fn mark_line(&mut self, line_no: usize, comment: &str) {
        self.push_line(&format!("#line {} \"{}\"", line_no, comment))
    }
}

impl SourceOutput for String {
    fn push_line(&mut self, str: &str) {
        self.push_str(str);
        self.push('\n');
    }
}

/// Where include directives are resolved.
pub(crate) struct IncludeResolver<'a> {
    pub(crate) search_paths: &'a [PathBuf],
    pub(crate) library_root: Option<&'a Path>,
    pub(crate) line_directives: bool,
}

impl IncludeResolver<'_> {
    fn resolve(&self, name: &str, library: bool, includer: &Path) -> Option<PathBuf> {
        if library {
            return self
                .library_root
                .map(|root| root.join(name))
                .filter(|path| path.is_file());
        }

        self.search_paths
            .iter()
            .map(PathBuf::as_path)
            .chain(includer.parent())
            .map(|dir| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Splice every include of `source` into the output, recursively.
    pub(crate) fn expand(&self, source: &str, path: &Path) -> Result<String, PreprocessError> {
        let mut output = String::with_capacity(source.len());
        self.preprocess(source, path, &mut output, 0)?;
        Ok(output)
    }

    fn preprocess(
        &self,
        source: &str,
        file_name: &Path,
        output: &mut String,
        depth: usize,
    ) -> Result<(), PreprocessError> {
        if depth > MAX_INCLUDE_DEPTH {
            return Err(PreprocessError::IncludeDepthExceeded(file_name.to_path_buf()));
        }

        let short_name = file_name
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("");

        for (line_no, line) in source.lines().enumerate() {
            let Some(include) = parse_include(line)? else {
                output.push_line(line);
                continue;
            };

            let include_path = self
                .resolve(include.path, include.library, file_name)
                .ok_or_else(|| PreprocessError::MissingInclude {
                    name: include.path.to_string(),
                    from: file_name.to_path_buf(),
                })?;

            let included = read_text(&include_path).map_err(|e| match e {
                CacheError::PathMissing(_) => PreprocessError::MissingInclude {
                    name: include.path.to_string(),
                    from: file_name.to_path_buf(),
                },
                e => PreprocessError::Cache(e),
            })?;

            log::trace!("including {} from {}", include_path.display(), short_name);
            if self.line_directives {
                let included_name = include_path
                    .file_name()
                    .and_then(|f| f.to_str())
                    .unwrap_or("");
                output.mark_line(1, included_name);
                self.preprocess(&included, &include_path, output, depth + 1)?;
                output.mark_line(line_no + 2, short_name);
            } else {
                self.preprocess(&included, &include_path, output, depth + 1)?;
            }
        }
        Ok(())
    }
}
