//! Shader stage source generation.
//!
//! The [`Generator`] turns a stage body file into a complete, compilable source. Phases run in a
//! fixed order, each stripping its own markers before the next one sees the text:
//!
//! 1. `#include "..."` and `#include <...>` directives are spliced in.
//! 2. `#pragma interface_override begin/end` regions and `#pragma no_fragment_output` are applied.
//! 3. Catalog and caller supplied extensions are enabled.
//! 4. `spec_const <type> <name> = <value>;` declarations receive sequential constant ids.
//! 5. `#pragma use_resource_block "NAME"` directives are expanded into binding declarations.
//! 6. The fragments are joined in [`FragmentKind`] order.
//!
//! Generated sources are cached in a [`SourceCache`](shaderforge_cache::SourceCache) and
//! regenerated when the body file is modified.
mod error;
mod fragment;
mod generator;
mod include;
mod interface;
mod options;
mod pragma;
mod resource_block;
mod spec_const;

pub use error::*;
pub use fragment::{Fragment, FragmentKind};
pub use generator::{GeneratedSource, Generator};
pub use include::MAX_INCLUDE_DEPTH;
pub use options::{GeneratorOptions, LIBRARY_PATH_ENV};
pub use resource_block::{declare_resource, ResourceBlock};
pub use spec_const::SpecConstant;
