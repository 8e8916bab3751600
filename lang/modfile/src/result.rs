use miette::Diagnostic;
use thiserror::Error;

use lasr_lang_asr::AsrError;

pub type ModfileResult<T = ()> = Result<T, ModfileError>;

#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum ModfileError {
    #[error("File is not a LASR modfile")]
    #[diagnostic(code("M-001"), help("Recompile the module to produce a modfile"))]
    FormatNotRecognized,
    #[error("Incompatible modfile version {found}, expected {expected}")]
    #[diagnostic(code("M-002"), help("Recompile the module with this version of the compiler"))]
    IncompatibleVersion { found: String, expected: String },
    #[error("Malformed modfile: {message}")]
    #[diagnostic(code("M-003"))]
    Malformed { message: String },
    #[error("A modfile must hold exactly one module, found {count} top-level symbols")]
    #[diagnostic(code("M-004"))]
    NotSingleModule { count: usize },
    #[error("`{name}` is a {actual}, only modules can be saved")]
    #[diagnostic(code("M-005"))]
    NotAModule { name: String, actual: &'static str },
    #[error("Modfile refers to `{name}` in symbol table {symtab}, which it does not contain")]
    #[diagnostic(code("M-006"))]
    DanglingReference { symtab: u64, name: String },
    #[error(transparent)]
    #[diagnostic(transparent)]
    Asr(#[from] AsrError),
}

impl ModfileError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        ModfileError::Malformed { message: message.into() }
    }
}

impl From<serde_json::Error> for ModfileError {
    fn from(err: serde_json::Error) -> Self {
        ModfileError::malformed(err.to_string())
    }
}
