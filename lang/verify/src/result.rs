use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

pub type VerifyResult<T = ()> = Result<T, VerifyError>;

/// A violated structural invariant of an ASR tree.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("The symbol table of `{owner}` does not exist")]
    #[diagnostic(code("V-001"))]
    DanglingSymtab {
        owner: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error(
        "The symbol table of `{owner}` has the wrong parent: expected table {expected:?}, found {found:?}"
    )]
    #[diagnostic(code("V-002"))]
    WrongParent {
        owner: String,
        expected: Option<u64>,
        found: Option<u64>,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Symbol table counter {counter} of `{owner}` is not unique")]
    #[diagnostic(code("V-003"))]
    DuplicateCounter {
        owner: String,
        counter: u64,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("The symbol table of `{owner}` does not point back to it as its owner")]
    #[diagnostic(code("V-004"))]
    WrongOwner {
        owner: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("The {kind} `{name}` must be defined in the global scope")]
    #[diagnostic(code("V-005"))]
    NotInGlobalScope {
        kind: &'static str,
        name: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Variable `{name}` is not registered in its parent symbol table")]
    #[diagnostic(code("V-006"))]
    NotInParentSymtab {
        name: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("The parent symbol table of `{name}` is not part of the translation unit")]
    #[diagnostic(code("V-007"))]
    UnregisteredParentSymtab {
        name: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("External symbol `{name}` is not linked")]
    #[diagnostic(code("V-008"))]
    UnlinkedExternal {
        name: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("External symbol `{name}` points to another external symbol")]
    #[diagnostic(code("V-009"))]
    ChainedExternal {
        name: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("External symbol `{name}` has original name `{original_name}`, but its target is `{target}`")]
    #[diagnostic(code("V-010"))]
    ExternalNameMismatch {
        name: String,
        original_name: String,
        target: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("External symbol `{name}` names module `{module_name}`, but its target is in {actual}")]
    #[diagnostic(code("V-011"))]
    ExternalModuleMismatch {
        name: String,
        module_name: String,
        /// The module actually containing the target, or a description if there is none.
        actual: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Looking up `{name}` through its module and scope names does not yield its target")]
    #[diagnostic(code("V-012"))]
    ExternalLookupMismatch {
        name: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("{node} refers to `{name}`, which is outside of its symbol table")]
    #[diagnostic(code("V-013"))]
    OutOfScope {
        node: &'static str,
        name: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Module `{module}` has an invalid dependency name `{dependency}`")]
    #[diagnostic(code("V-014"))]
    InvalidDependency {
        module: String,
        dependency: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("{node} refers to `{name}`, which is a {actual} instead of a {expected}")]
    #[diagnostic(code("V-015"))]
    WrongSymbolKind {
        node: &'static str,
        name: String,
        expected: &'static str,
        actual: &'static str,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("{node} is called on a value that is not of a derived type")]
    #[diagnostic(code("V-016"))]
    NotADerivedType {
        node: &'static str,
        #[label]
        span: Option<SourceSpan>,
    },
}
