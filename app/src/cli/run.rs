use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use lasr_lang_driver::{Compilation, DriverError, MainResult};
use lasr_lang_printer::{ColorChoice, PrintCfg, PrintExt, StandardStream};

use super::SearchArgs;

#[derive(clap::Args)]
pub struct Args {
    #[clap(value_parser, value_name = "MODFILE")]
    filepath: PathBuf,
    /// Passes to run instead of the default ones, separated by commas
    #[clap(long, value_name = "LIST", default_value = "")]
    pass: String,
    /// Passes to leave out, separated by commas
    #[clap(long, value_name = "LIST", default_value = "")]
    skip_pass: String,
    /// Run the optimizing passes as well
    #[clap(long)]
    fast: bool,
    /// Run every pass up to the last one given with --pass
    #[clap(long)]
    cumulative: bool,
    /// Print the tree after every pass
    #[clap(long)]
    dump_all_passes: bool,
    /// Report how long every pass took
    #[clap(long)]
    time_report: bool,
    #[clap(flatten)]
    search: SearchArgs,
}

pub fn exec(cmd: Args) -> MainResult {
    let mut options = cmd.search.options(&cmd.filepath);
    options.pass_options.fast = cmd.fast;
    options.pass_options.cumulative = cmd.cumulative;
    options.pass_options.dump_all_passes = cmd.dump_all_passes;
    options.pass_options.time_report = cmd.time_report;
    options.pass_options.verify_each_pass = true;
    options.pass_options.verbose = log::log_enabled!(log::Level::Info);

    let mut compilation = Compilation::from_filesystem(options);
    compilation.pass_manager.parse_pass_arg(&cmd.pass, &cmd.skip_pass)?;
    compilation.open_modfile(&cmd.filepath)?;
    compilation.link()?;
    compilation.apply_passes()?;

    for (name, dump) in &compilation.pass_manager.dumps {
        println!("// {name}");
        println!("{dump}");
    }
    print_tree(&compilation).map_err(|err| DriverError::Io(Arc::new(err)))?;
    Ok(())
}

fn print_tree(compilation: &Compilation) -> std::io::Result<()> {
    let choice =
        if std::io::stdout().is_terminal() { ColorChoice::Auto } else { ColorChoice::Never };
    let mut stream = StandardStream::stdout(choice);
    compilation.asr.print_colored(&PrintCfg::default(), &mut stream)?;
    println!();
    Ok(())
}
