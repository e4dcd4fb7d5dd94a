use crate::include::SourceOutput;

/// The kind of a generated source fragment.
///
/// Fragments are emitted in the order of their kinds. Extension directives must precede every
/// declaration, so they follow the version line directly.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FragmentKind {
    Version,
    Extension,
    InterfaceInput,
    InterfaceOutput,
    PerVertex,
    SpecConstant,
    ResourceBlock,
    Body,
}

/// A piece of generated source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub text: String,
}

/// Collects fragments and joins them in kind order.
#[derive(Debug, Default)]
pub(crate) struct SourceAssembly {
    fragments: Vec<Fragment>,
}

impl SourceAssembly {
    pub(crate) fn push(&mut self, kind: FragmentKind, text: impl Into<String>) {
        self.fragments.push(Fragment {
            kind,
            text: text.into(),
        });
    }

    pub(crate) fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Join the fragments. Fragments of the same kind keep their insertion order.
    pub(crate) fn assemble(mut self) -> String {
        self.fragments.sort_by_key(|fragment| fragment.kind);
        let capacity = self.fragments.iter().map(|f| f.text.len() + 1).sum();
        let mut output = String::with_capacity(capacity);
        for fragment in &self.fragments {
            let text = fragment.text.strip_suffix('\n').unwrap_or(&fragment.text);
            output.push_line(text);
        }
        output
    }
}
