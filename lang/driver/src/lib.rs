//! The compiler driver: reading modfiles, loading the modules a translation unit depends
//! on, and running the pass pipeline over the result.

mod compilation;
mod fs;
pub mod loader;
mod options;
mod result;

pub use compilation::Compilation;
pub use fs::*;
pub use loader::{find_and_load_module, load_module};
pub use options::*;
pub use result::*;
