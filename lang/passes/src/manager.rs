use std::time::Instant;

use lasr_lang_asr::Asr;
use lasr_lang_printer::PrintToString;
use lasr_lang_verify::verify;

use crate::options::{Backend, PassOptions};
use crate::result::{PassError, PassResult};

pub type PassFn = fn(&mut Asr, &PassOptions) -> PassResult;

/// Every pass by name, in the order they run when all of them are requested.
pub const PASSES: &[(&str, PassFn)] = &[
    ("global_stmts", crate::global_stmts::global_stmts),
    ("instantiate_template", crate::instantiate_template::instantiate_template),
    ("implied_do_loops", crate::implied_do_loops::implied_do_loops),
    ("class_constructor", crate::class_constructor::class_constructor),
    ("where", crate::where_construct::where_construct),
    ("arr_slice", crate::arr_slice::arr_slice),
    ("print_list_tuple", crate::print_list_tuple::print_list_tuple),
    ("print_arr", crate::print_arr::print_arr),
    ("inline_function_calls", crate::inline_function_calls::inline_function_calls),
    (
        "promote_allocatable_to_nonallocatable",
        crate::promote_allocatable::promote_allocatable_to_nonallocatable,
    ),
    ("unused_functions", crate::unused_functions::unused_functions),
];

pub const DEFAULT_PASSES: &[&str] = &[
    "global_stmts",
    "instantiate_template",
    "implied_do_loops",
    "class_constructor",
    "where",
    "arr_slice",
    "print_list_tuple",
    "print_arr",
];

/// Run after [`DEFAULT_PASSES`] in fast mode.
pub const OPTIMIZATION_PASSES: &[&str] =
    &["inline_function_calls", "promote_allocatable_to_nonallocatable", "unused_functions"];

const C_BACKEND_SKIPPED: &[&str] = &["print_list_tuple", "inline_function_calls"];

const RTLIB_SKIPPED: &[&str] = &["unused_functions"];

fn catalog_index(name: &str) -> Option<usize> {
    PASSES.iter().position(|(pass, _)| *pass == name)
}

fn supported_passes() -> String {
    PASSES.iter().map(|(name, _)| *name).collect::<Vec<_>>().join(", ")
}

fn parse_list(list: &str) -> PassResult<Vec<&'static str>> {
    list.split([',', ' '])
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            let lower = name.to_lowercase();
            catalog_index(&lower).map(|idx| PASSES[idx].0).ok_or_else(|| PassError::UnknownPass {
                name: name.to_owned(),
                supported: supported_passes(),
            })
        })
        .collect()
}

/// Selects the passes to run and runs them, verifying the tree in between.
#[derive(Debug, Default)]
pub struct PassManager {
    requested: Vec<&'static str>,
    skipped: Vec<&'static str>,
    /// Printouts of the tree after each pass, when `dump_all_passes` is set.
    pub dumps: Vec<(String, String)>,
}

impl PassManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the passes to run and the passes to leave out from comma or space separated
    /// lists. An empty `passes` keeps the canonical ordering.
    pub fn parse_pass_arg(&mut self, passes: &str, skip: &str) -> PassResult {
        self.requested = parse_list(passes)?;
        self.skipped = parse_list(skip)?;
        Ok(())
    }

    /// The names of the passes [`PassManager::apply_passes`] runs, in order.
    pub fn pipeline(&self, options: &PassOptions) -> Vec<&'static str> {
        let selected: Vec<&'static str> = if self.requested.is_empty() {
            let optimizing: &[&str] = if options.fast { OPTIMIZATION_PASSES } else { &[] };
            DEFAULT_PASSES.iter().chain(optimizing).copied().collect()
        } else if options.cumulative {
            let last = self.requested.iter().filter_map(|name| catalog_index(name)).max();
            match last {
                Some(last) => PASSES[..=last].iter().map(|(name, _)| *name).collect(),
                None => vec![],
            }
        } else {
            self.requested.clone()
        };
        selected
            .into_iter()
            .filter(|name| !self.skipped.contains(name))
            .filter(|name| !(options.backend == Backend::C && C_BACKEND_SKIPPED.contains(name)))
            .filter(|name| !(options.rtlib && RTLIB_SKIPPED.contains(name)))
            .collect()
    }

    pub fn apply_passes(&mut self, asr: &mut Asr, options: &PassOptions) -> PassResult {
        self.dumps.clear();
        for (n, name) in self.pipeline(options).into_iter().enumerate() {
            let Some(idx) = catalog_index(name) else {
                continue;
            };
            let pass = PASSES[idx].1;

            if options.verbose {
                log::info!("ASR pass starts: '{name}'");
            } else {
                log::debug!("ASR pass starts: '{name}'");
            }
            let start = Instant::now();
            pass(asr, options)?;
            let elapsed = start.elapsed();
            if options.time_report {
                log::info!("ASR pass '{name}' took {:.3} ms", elapsed.as_secs_f64() * 1000.0);
            }
            if options.verbose {
                log::info!("ASR pass ends: '{name}'");
            } else {
                log::debug!("ASR pass ends: '{name}'");
            }

            if options.dump_all_passes {
                self.dumps.push((format!("pass_{:02}_{name}", n + 1), asr.print_to_string(None)));
            }
            if options.verify_each_pass {
                verify(asr, true).map_err(|source| PassError::VerificationFailure {
                    pass: name.to_owned(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}
