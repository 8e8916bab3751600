use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

pub type AsrResult<T = ()> = Result<T, AsrError>;

/// Errors in the input program discovered while building, querying or linking ASR.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum AsrError {
    #[error("Symbol `{name}` is already defined in this scope")]
    #[diagnostic(code("A-001"))]
    DuplicateSymbol {
        name: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Symbol `{name}` not found")]
    #[diagnostic(code("A-002"))]
    NotFound {
        name: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Unable to resolve external symbol `{name}` through `{path}`")]
    #[diagnostic(code("A-003"))]
    UnresolvedExternal {
        name: String,
        /// The scope names that were searched, joined by `::`.
        path: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Cyclic dependency: {}", cycle.join(" -> "))]
    #[diagnostic(code("A-004"))]
    CyclicDependency { cycle: Vec<String> },
    #[error("Expected `{name}` to be a {expected}, but it is a {actual}")]
    #[diagnostic(code("A-005"))]
    WrongSymbolKind {
        name: String,
        expected: &'static str,
        actual: &'static str,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("No specific procedure of `{name}` matches the given argument types")]
    #[diagnostic(code("A-006"))]
    NoMatchingProcedure {
        name: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Cannot duplicate {what}")]
    #[diagnostic(code("A-007"))]
    CannotDuplicate {
        what: String,
        #[label]
        span: Option<SourceSpan>,
    },
}
