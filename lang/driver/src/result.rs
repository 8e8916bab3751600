use std::path::PathBuf;
use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;

use lasr_lang_asr::AsrError;
use lasr_lang_modfile::ModfileError;
use lasr_lang_passes::PassError;
use lasr_lang_verify::VerifyError;

pub type DriverResult<T = ()> = Result<T, DriverError>;

pub type MainResult<T = ()> = Result<T, MainError>;

#[derive(Error, Diagnostic, Debug, Clone)]
#[error(transparent)]
#[diagnostic(transparent)]
pub enum MainError {
    Asr(#[from] AsrError),
    Verify(#[from] VerifyError),
    Modfile(#[from] ModfileError),
    Pass(#[from] PassError),
    Driver(#[from] DriverError),
}

impl MainError {
    /// Whether the error is a bug of the compiler rather than a problem with its input.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            MainError::Verify(_) | MainError::Pass(PassError::VerificationFailure { .. })
        )
    }
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum DriverError {
    #[error("File not found: {}", .0.display())]
    #[diagnostic(code("D-001"))]
    FileNotFound(PathBuf),
    #[error("IO error: {0}")]
    #[diagnostic(code("D-002"))]
    Io(#[from] Arc<std::io::Error>),
    #[error("Module `{name}` not found")]
    #[diagnostic(
        code("D-003"),
        help("Compile the module first, or add the directory holding `{name}.mod` with -I")
    )]
    ModuleNotFound { name: String },
    #[error("`{name}` is a {actual}, not a module")]
    #[diagnostic(code("D-004"))]
    NotAModule { name: String, actual: &'static str },
    #[error("Modfile for `{name}` contains module `{found}`")]
    #[diagnostic(code("D-005"))]
    WrongModule { name: String, found: String },
    #[error("Modfile for `{name}` must contain exactly one module, found {count} top-level symbols")]
    #[diagnostic(code("D-006"))]
    NotSingleModule { name: String, count: usize },
    #[error("Failed to link module `{module}`: {message}")]
    #[diagnostic(code("D-007"))]
    ModuleLink { module: String, message: String },
}
