use lasr_lang_driver::MainResult;
use lasr_lang_passes::{PassManager, PassOptions};

#[derive(clap::Args)]
pub struct Args {
    /// Include the optimizing passes
    #[clap(long)]
    fast: bool,
}

pub fn exec(cmd: Args) -> MainResult {
    let options = PassOptions { fast: cmd.fast, ..PassOptions::default() };
    for name in PassManager::new().pipeline(&options) {
        println!("{name}");
    }
    Ok(())
}
