use miette::Diagnostic;
use thiserror::Error;

use lasr_lang_asr::AsrError;
use lasr_lang_verify::VerifyError;

pub type PassResult<T = ()> = Result<T, PassError>;

#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum PassError {
    #[error("ASR verification failed after pass `{pass}`")]
    #[diagnostic(code("P-001"), help("This is a bug in the compiler, please report it"))]
    VerificationFailure {
        pass: String,
        #[source]
        #[diagnostic_source]
        source: VerifyError,
    },
    #[error("Unknown pass `{name}`, the supported passes are: {supported}")]
    #[diagnostic(code("P-002"))]
    UnknownPass { name: String, supported: String },
    #[error(transparent)]
    #[diagnostic(transparent)]
    Asr(#[from] AsrError),
}
