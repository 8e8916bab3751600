//! The ASR verifier.
//!
//! A failed check means that the compiler itself produced a malformed tree: the errors
//! of this crate are internal compiler errors, not diagnostics about the input program.

mod result;
mod verifier;

pub use result::*;
pub use verifier::verify;
