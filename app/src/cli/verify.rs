use std::path::PathBuf;

use lasr_lang_driver::{Compilation, MainResult};

use super::SearchArgs;

#[derive(clap::Args)]
pub struct Args {
    #[clap(value_parser, value_name = "MODFILE")]
    filepath: PathBuf,
    /// Do not load used modules and do not check external symbols
    #[clap(long)]
    no_external: bool,
    #[clap(flatten)]
    search: SearchArgs,
}

pub fn exec(cmd: Args) -> MainResult {
    let mut options = cmd.search.options(&cmd.filepath);
    options.check_external = !cmd.no_external;
    let mut compilation = Compilation::from_filesystem(options);
    compilation.open_modfile(&cmd.filepath)?;
    if !cmd.no_external {
        compilation.link()?;
    }
    compilation.verify()?;
    println!("{} verified successfully!", cmd.filepath.display());
    Ok(())
}
