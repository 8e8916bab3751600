use std::process::ExitCode;

mod cli;
mod global_settings;

fn main() -> ExitCode {
    cli::exec()
}
