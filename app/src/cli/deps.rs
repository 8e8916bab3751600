use std::path::PathBuf;

use lasr_lang_driver::{Compilation, MainResult};

use super::SearchArgs;

#[derive(clap::Args)]
pub struct Args {
    #[clap(value_parser, value_name = "MODFILE")]
    filepath: PathBuf,
    #[clap(flatten)]
    search: SearchArgs,
}

pub fn exec(cmd: Args) -> MainResult {
    let mut compilation = Compilation::from_filesystem(cmd.search.options(&cmd.filepath));
    compilation.open_modfile(&cmd.filepath)?;
    compilation.link()?;
    for module in compilation.module_order()? {
        println!("{module}");
    }
    Ok(())
}
