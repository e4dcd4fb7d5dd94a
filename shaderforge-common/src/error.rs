use std::fmt::{Display, Formatter};
use std::panic::Location;

/// The flat error taxonomy shared by every shaderforge component.
///
/// Kinds are partitioned numerically by the component that raises them:
///
/// | range | component             |
/// |-------|-----------------------|
/// | 1xxx  | resource catalog      |
/// | 2xxx  | source generation     |
/// | 3xxx  | external compiler     |
/// | 4xxx  | binary reflection     |
/// | 5xxx  | cache and filesystem  |
/// | 6xxx  | stage processing      |
#[repr(u32)]
#[non_exhaustive]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    CatalogParse = 1000,
    CatalogMissingSection = 1001,
    CatalogDuplicateName = 1002,
    CatalogInvalidValue = 1003,
    CatalogIo = 1004,

    MissingBody = 2000,
    MissingInclude = 2001,
    ResourceGroupNotFound = 2002,
    InvalidDescriptorKind = 2003,
    IncludeDepthExceeded = 2004,
    MalformedDirective = 2005,
    UnterminatedInterfaceOverride = 2006,

    CompilerInit = 3000,
    CompilationFailed = 3001,
    RecompileUnsupported = 3002,

    InvalidBinary = 4000,
    InvalidDescriptorType = 4001,
    DuplicateDescriptorType = 4002,
    InvalidBindingIndex = 4003,
    BindingMismatch = 4004,
    UnsupportedSpecConstant = 4005,
    MultiplePushConstantBlocks = 4006,
    DescriptorConflict = 4007,
    StageAlreadyParsed = 4008,
    PushConstantOverflow = 4009,

    PathMissing = 5000,
    OpenFailed = 5001,
    CacheEntryMissing = 5002,
    BatchFailed = 5003,
    PersistentStore = 5004,

    StageNotFound = 6000,
    StageFailed = 6001,
    StageWithheld = 6002,
}

impl ErrorKind {
    /// The numeric code of the kind.
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// The component partition the kind belongs to, e.g. `2` for generation errors.
    pub fn partition(&self) -> u32 {
        self.code() / 1000
    }

    /// Whether the kind must stop the whole pipeline rather than only the failing stage.
    ///
    /// A catalog missing required sections cannot drive any stage, and a binding mismatch
    /// between generated source and reflected binary is an internal consistency violation.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ErrorKind::CatalogMissingSection | ErrorKind::BindingMismatch
        )
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

/// An error that carries a kind from the flat taxonomy.
pub trait Reportable: std::error::Error {
    /// The kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A reported error: its kind, a human readable message, and where it was reported.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub message: String,
    pub location: &'static Location<'static>,
}

impl Diagnostic {
    /// Create a diagnostic located at the caller.
    #[track_caller]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
            location: Location::caller(),
        }
    }

    /// Create a diagnostic from a reportable error, located at the caller.
    #[track_caller]
    pub fn from_error<E: Reportable + ?Sized>(error: &E) -> Self {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Diagnostic {
            kind: error.kind(),
            message,
            location: Location::caller(),
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} ({}:{})",
            self.kind,
            self.message,
            self.location.file(),
            self.location.line()
        )
    }
}

/// Accumulates the errors reported during one logical unit of work.
///
/// A session is owned by exactly one task. Sessions of concurrently running tasks are merged
/// into their owner with [`ErrorSession::merge`] after the tasks are joined.
#[derive(Debug, Default, Clone)]
pub struct ErrorSession {
    diagnostics: Vec<Diagnostic>,
}

impl ErrorSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reportable error.
    #[track_caller]
    pub fn report<E: Reportable + ?Sized>(&mut self, error: &E) {
        self.diagnostics.push(Diagnostic::from_error(error));
    }

    /// Record an error of the given kind with a message.
    #[track_caller]
    pub fn report_kind(&mut self, kind: ErrorKind, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::new(kind, message));
    }

    /// Record the error of a result, if any, and pass the success value through.
    #[track_caller]
    pub fn check<T, E: Reportable>(&mut self, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.report(&error);
                None
            }
        }
    }

    /// Move every diagnostic of `other` into this session.
    pub fn merge(&mut self, other: ErrorSession) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Whether any recorded error must stop the whole pipeline.
    pub fn has_fatal(&self) -> bool {
        self.diagnostics.iter().any(|d| d.kind.is_fatal())
    }

    /// The first recorded error that must stop the whole pipeline.
    pub fn first_fatal(&self) -> Option<&Diagnostic> {
        self.diagnostics.iter().find(|d| d.kind.is_fatal())
    }

    /// Whether an error of the given kind was recorded.
    pub fn contains(&self, kind: ErrorKind) -> bool {
        self.diagnostics.iter().any(|d| d.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn into_inner(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl Display for ErrorSession {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for diagnostic in &self.diagnostics {
            writeln!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}
