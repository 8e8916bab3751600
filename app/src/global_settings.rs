use std::{env, str::FromStr};

#[derive(Debug, Clone)]
pub struct GlobalSettings {
    pub log_level: log::LevelFilter,
}

impl GlobalSettings {
    /// Settings from `LASR_LOG_LEVEL`, raised by the `--verbose` and `--trace` flags.
    pub fn from_env(verbose: bool, trace: bool) -> Self {
        let from_env = env::var("LASR_LOG_LEVEL")
            .ok()
            .and_then(|var| log::LevelFilter::from_str(&var.to_uppercase()).ok())
            .unwrap_or(log::LevelFilter::Warn);

        let log_level = if trace {
            log::LevelFilter::Trace
        } else if verbose {
            from_env.max(log::LevelFilter::Info)
        } else {
            from_env
        };
        Self { log_level }
    }

    /// Install the logger. `RUST_LOG` still takes precedence for individual modules.
    pub fn init_logger(&self) {
        env_logger::Builder::new()
            .filter_level(self.log_level)
            .parse_env("RUST_LOG")
            .format_timestamp(None)
            .init();
    }
}
