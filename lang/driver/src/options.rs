use std::path::PathBuf;

use lasr_lang_passes::PassOptions;

/// Settings of one compilation.
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// Directories searched for modfiles, in order.
    pub include_dirs: Vec<PathBuf>,
    /// Where the modfiles of intrinsic modules live.
    pub runtime_library_dir: PathBuf,
    /// Check external symbols when verifying a translation unit.
    pub check_external: bool,
    /// Verify the translation unit after modules were loaded into it.
    pub run_verify: bool,
    pub pass_options: PassOptions,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            include_dirs: vec![PathBuf::new()],
            runtime_library_dir: PathBuf::from("runtime"),
            check_external: true,
            run_verify: true,
            pass_options: PassOptions::default(),
        }
    }
}
