use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use lasr_lang_driver::{CompilerOptions, MainError};

use crate::global_settings::GlobalSettings;

mod deps;
mod passes;
mod run;
mod verify;

/// Exit code of internal compiler errors.
const ICE_EXIT_CODE: u8 = 101;

pub fn exec() -> ExitCode {
    use Command::*;
    let cli = Cli::parse();
    GlobalSettings::from_env(cli.verbose, cli.trace).init_logger();
    let result = match cli.command {
        Verify(args) => verify::exec(args),
        Passes(args) => passes::exec(args),
        Deps(args) => deps::exec(args),
        Run(args) => run::exec(args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(err),
    }
}

fn report(err: MainError) -> ExitCode {
    let internal = err.is_internal();
    eprintln!("{:?}", miette::Report::new(err));
    if internal {
        eprintln!("error: internal compiler error, please report this as a bug");
        ExitCode::from(ICE_EXIT_CODE)
    } else {
        ExitCode::FAILURE
    }
}

#[derive(Parser)]
#[clap(version, author, about, long_about = None)]
struct Cli {
    /// Log the progress of loading modules and running passes
    #[clap(long, global = true)]
    verbose: bool,
    /// Log every detail
    #[clap(long, global = true)]
    trace: bool,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check the structural invariants of a modfile
    Verify(verify::Args),
    /// List the passes that run by default
    Passes(passes::Args),
    /// Print the modules of a modfile in load order
    Deps(deps::Args),
    /// Load a modfile, link it, run passes over it and print the result
    Run(run::Args),
}

/// Where modfiles are searched.
#[derive(clap::Args)]
pub struct SearchArgs {
    /// Directory to search for modfiles of used modules
    #[clap(short = 'I', value_name = "DIR")]
    include_dirs: Vec<PathBuf>,
    /// Directory holding the modfiles of intrinsic modules
    #[clap(long, value_name = "DIR")]
    runtime_library_dir: Option<PathBuf>,
}

impl SearchArgs {
    /// Options searching the directory of `modfile` first, then the include directories.
    pub fn options(&self, modfile: &std::path::Path) -> CompilerOptions {
        let mut options = CompilerOptions::default();
        let own_dir = modfile.parent().map(PathBuf::from).unwrap_or_default();
        options.include_dirs = std::iter::once(own_dir).chain(self.include_dirs.clone()).collect();
        if let Some(dir) = &self.runtime_library_dir {
            options.runtime_library_dir = dir.clone();
        }
        options
    }
}
