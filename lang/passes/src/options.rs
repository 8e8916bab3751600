use std::path::PathBuf;

/// The code generator the passes prepare the tree for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Llvm,
    C,
    Wasm,
    Fortran,
}

/// Settings shared by the pass manager and the individual passes.
#[derive(Debug, Clone)]
pub struct PassOptions {
    /// Run the optimizing passes after the default ones and inline every eligible call,
    /// not only calls to procedures marked inlinable.
    pub fast: bool,
    /// Report the start and end of every pass at `info` level.
    pub verbose: bool,
    /// Report how long every pass took.
    pub time_report: bool,
    /// Run the verifier after every pass.
    pub verify_each_pass: bool,
    /// Keep a printout of the tree after every pass in [`PassManager::dumps`](crate::PassManager::dumps).
    pub dump_all_passes: bool,
    /// Run every pass up to the last one requested instead of only the requested ones.
    pub cumulative: bool,
    pub runtime_library_dir: PathBuf,
    /// Also inline calls made through external symbols.
    pub inline_external_symbol_calls: bool,
    /// Compiling the runtime library itself.
    pub rtlib: bool,
    pub backend: Backend,
}

impl Default for PassOptions {
    fn default() -> Self {
        PassOptions {
            fast: false,
            verbose: false,
            time_report: false,
            verify_each_pass: cfg!(debug_assertions),
            dump_all_passes: false,
            cumulative: false,
            runtime_library_dir: PathBuf::new(),
            inline_external_symbol_calls: true,
            rtlib: false,
            backend: Backend::default(),
        }
    }
}
