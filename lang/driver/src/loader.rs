//! Loading compiled modules into a translation unit.
//!
//! A module is read from its modfile, spliced into the global scope, and followed by
//! every module it depends on until nothing is missing. External symbols are linked
//! only once all modules are present.

use std::path::PathBuf;

use lasr_lang_asr::deps::determine_module_dependencies;
use lasr_lang_asr::external::fix_external_symbols;
use lasr_lang_asr::{Abi, Asr, Symbol, SymbolId};
use lasr_lang_modfile::load_modfile;
use lasr_lang_verify::verify;

use crate::fs::FileSource;
use crate::options::CompilerOptions;
use crate::result::{DriverError, MainResult};

/// Intrinsic modules are stored in the runtime library under this prefix.
pub const INTRINSIC_PREFIX: &str = "lasr_intrinsic_";

/// Standard modules that are provided by the runtime library.
const INTRINSIC_ALIASES: &[&str] = &["iso_c_binding", "iso_fortran_env"];

pub fn modfile_name(name: &str) -> String {
    format!("{name}.mod")
}

fn intrinsic_name(name: &str) -> String {
    format!("{INTRINSIC_PREFIX}{name}")
}

/// The module registered in the global scope as `name`, or as its intrinsic counterpart.
fn loaded(asr: &Asr, name: &str) -> MainResult<Option<SymbolId>> {
    let global = asr.symtab(asr.global_scope());
    let found = global.get(name).or_else(|| {
        INTRINSIC_ALIASES.contains(&name).then(|| global.get(&intrinsic_name(name))).flatten()
    });
    match found {
        None => Ok(None),
        Some(sym) => match asr.symbol(sym) {
            Symbol::Module(_) => Ok(Some(sym)),
            other => Err(DriverError::NotAModule {
                name: name.to_owned(),
                actual: other.kind().as_str(),
            }
            .into()),
        },
    }
}

/// Load module `name` and everything it depends on into the global scope, then link
/// the translation unit.
///
/// A module that is already present is returned as is.
pub fn load_module(
    asr: &mut Asr,
    source: &mut dyn FileSource,
    options: &CompilerOptions,
    name: &str,
    intrinsic: bool,
) -> MainResult<SymbolId> {
    if let Some(module) = loaded(asr, name)? {
        log::debug!("Module `{name}` is already loaded");
        return Ok(module);
    }
    let module = load_one(asr, source, options, name, intrinsic)?;
    load_dependencies(asr, source, options)?;
    link(asr, options, name)?;
    Ok(module)
}

/// Load every module that a module of the translation unit depends on but that is not
/// present yet, until a fixed point is reached.
pub fn load_dependencies(
    asr: &mut Asr,
    source: &mut dyn FileSource,
    options: &CompilerOptions,
) -> MainResult {
    loop {
        let mut missing = Vec::new();
        for dep in determine_module_dependencies(asr)? {
            if loaded(asr, &dep)?.is_none() {
                missing.push(dep);
            }
        }
        if missing.is_empty() {
            return Ok(());
        }
        log::debug!("Loading missing modules: {}", missing.join(", "));
        for dep in missing {
            let intrinsic = dep.starts_with(INTRINSIC_PREFIX);
            load_one(asr, source, options, &dep, intrinsic)?;
        }
    }
}

/// Resolve every external symbol and check the linked translation unit.
pub fn link(asr: &mut Asr, options: &CompilerOptions, module: &str) -> MainResult {
    let link_error = |message: String| DriverError::ModuleLink { module: module.to_owned(), message };
    fix_external_symbols(asr).map_err(|err| link_error(err.to_string()))?;
    if options.run_verify {
        verify(asr, true).map_err(|err| link_error(err.to_string()))?;
    }
    Ok(())
}

fn load_one(
    asr: &mut Asr,
    source: &mut dyn FileSource,
    options: &CompilerOptions,
    name: &str,
    intrinsic: bool,
) -> MainResult<SymbolId> {
    if let Some(module) = find_and_load_module(asr, source, options, name, intrinsic)? {
        return Ok(module);
    }
    if !intrinsic && INTRINSIC_ALIASES.contains(&name) {
        let alias = intrinsic_name(name);
        if let Some(module) = find_and_load_module(asr, source, options, &alias, true)? {
            return Ok(module);
        }
    }
    Err(DriverError::ModuleNotFound { name: name.to_owned() }.into())
}

/// Read the modfile of `name` and register its module in the global scope.
///
/// Intrinsic modules are read from the runtime library, all others from the first
/// include directory that has them. Returns `None` if no modfile exists. Dependencies
/// of the module are neither loaded nor linked.
pub fn find_and_load_module(
    asr: &mut Asr,
    source: &mut dyn FileSource,
    options: &CompilerOptions,
    name: &str,
    intrinsic: bool,
) -> MainResult<Option<SymbolId>> {
    let file = modfile_name(name);
    let candidates: Vec<PathBuf> = if intrinsic {
        vec![options.runtime_library_dir.join(&file)]
    } else {
        options.include_dirs.iter().map(|dir| dir.join(&file)).collect()
    };
    let mut text = None;
    for path in candidates {
        if let Some(found) = source.read_file(&path)? {
            log::debug!("Reading module `{name}` from {}", path.display());
            text = Some(found);
            break;
        }
    }
    let Some(text) = text else {
        return Ok(None);
    };

    let root = load_modfile(asr, &text, false)?;
    let symbols: Vec<(String, SymbolId)> =
        asr.symtab(root).scope().map(|(found, sym)| (found.to_owned(), sym)).collect();
    let (found, module) = match symbols.as_slice() {
        [(found, module)] => (found.clone(), *module),
        _ => {
            return Err(DriverError::NotSingleModule { name: name.to_owned(), count: symbols.len() }
                .into());
        }
    };
    if !matches!(asr.symbol(module), Symbol::Module(_)) {
        let actual = asr.symbol(module).kind().as_str();
        return Err(DriverError::NotAModule { name: found, actual }.into());
    }
    if found != name {
        return Err(DriverError::WrongModule { name: name.to_owned(), found }.into());
    }

    let global = asr.global_scope();
    asr.move_symbol(root, global, name)?;
    if let Some(m) = asr.symbol_mut(module).as_module_mut() {
        m.loaded_from_mod = true;
        m.intrinsic = intrinsic;
    }
    if intrinsic {
        mark_intrinsic(asr, module);
    }
    Ok(Some(module))
}

/// Give every procedure and variable of an intrinsic module the intrinsic ABI.
fn mark_intrinsic(asr: &mut Asr, module: SymbolId) {
    let Some(scope) = asr.symbol(module).symtab() else {
        return;
    };
    for sym in asr.symbols_in(scope) {
        match asr.symbol_mut(sym) {
            Symbol::Function(f) => f.abi = Abi::Intrinsic,
            Symbol::Variable(v) => v.abi = Abi::Intrinsic,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use lasr_lang_asr::builder::{self, FunctionBuilder};
    use lasr_lang_asr::{AsrError, Ttype};
    use lasr_lang_modfile::serialize_module;

    use crate::fs::InMemorySource;
    use crate::result::MainError;

    use super::*;

    /// `m3` holds a variable `x`, `m2` reads it through `get_x`, `m1` re-exports
    /// `get_x` from `m2`. Each module is written to its own modfile.
    fn chain() -> InMemorySource {
        let mut asr = Asr::new();
        let m3 = builder::add_module(&mut asr, "m3", &[]).unwrap();
        let m3_scope = asr.symbol(m3).symtab().unwrap();
        let x = builder::add_variable(&mut asr, m3_scope, "x", Ttype::int()).unwrap();

        let m2 = builder::add_module(&mut asr, "m2", &["m3"]).unwrap();
        let m2_scope = asr.symbol(m2).symtab().unwrap();
        let x_ext = builder::add_external(&mut asr, m2_scope, "x", x).unwrap();
        let get_x = FunctionBuilder::new(&mut asr, m2_scope, "get_x")
            .returns(Ttype::int())
            .finish()
            .unwrap();
        let get_x_scope = asr.symbol(get_x).symtab().unwrap();
        let ret = asr.symtab(get_x_scope).get("get_x").unwrap();
        let (target, value) = (asr.var(ret), asr.var(x_ext));
        let assign = asr.assign(target, value);
        builder::push_stmt(&mut asr, get_x, assign);

        let m1 = builder::add_module(&mut asr, "m1", &["m2"]).unwrap();
        let m1_scope = asr.symbol(m1).symtab().unwrap();
        builder::add_external(&mut asr, m1_scope, "get_x", get_x).unwrap();
        verify(&asr, true).unwrap();

        let mut source = InMemorySource::new();
        for module in [m1, m2, m3] {
            let name = asr.symbol(module).name().to_owned();
            source.insert(modfile_name(&name), serialize_module(&asr, module).unwrap());
        }
        source
    }

    #[test]
    fn dependencies_are_loaded_transitively() {
        let mut source = chain();
        let mut asr = Asr::new();
        let options = CompilerOptions::default();
        let m1 = load_module(&mut asr, &mut source, &options, "m1", false).unwrap();

        let global = asr.symtab(asr.global_scope());
        for name in ["m1", "m2", "m3"] {
            let module = global.get(name).unwrap();
            let module = asr.symbol(module).as_module().unwrap();
            assert!(module.loaded_from_mod);
            assert!(!module.intrinsic);
            assert_eq!(asr.symtab(module.symtab).parent, Some(asr.global_scope()));
        }

        let m1_scope = asr.symbol(m1).symtab().unwrap();
        let ext = asr.symtab(m1_scope).get("get_x").unwrap();
        let target = asr.symbol(ext).as_external().unwrap().external.unwrap();
        assert!(matches!(asr.symbol(target), Symbol::Function(_)));
        assert_eq!(asr.module_of(target), global.get("m2"));
        verify(&asr, true).unwrap();
    }

    #[test]
    fn loading_twice_returns_the_same_module() {
        let mut source = chain();
        let mut asr = Asr::new();
        let options = CompilerOptions::default();
        let first = load_module(&mut asr, &mut source, &options, "m2", false).unwrap();
        let again = load_module(&mut asr, &mut source, &options, "m2", false).unwrap();
        assert_eq!(first, again);
        assert_eq!(asr.symtab(asr.global_scope()).len(), 2);
    }

    #[test]
    fn missing_dependency_is_reported() {
        let mut source = chain();
        let mut broken = InMemorySource::new();
        for name in ["m1", "m2"] {
            let path = modfile_name(name);
            let text = source.read_to_string(Path::new(&path)).unwrap();
            broken.insert(path, text);
        }
        let mut asr = Asr::new();
        let err = load_module(&mut asr, &mut broken, &CompilerOptions::default(), "m1", false)
            .unwrap_err();
        assert!(matches!(
            err,
            MainError::Driver(DriverError::ModuleNotFound { name }) if name == "m3"
        ));
    }

    #[test]
    fn non_modules_are_rejected() {
        let mut asr = Asr::new();
        builder::add_program(&mut asr, "main").unwrap();
        let err = load_module(&mut asr, &mut InMemorySource::new(), &CompilerOptions::default(), "main", false)
            .unwrap_err();
        assert!(matches!(err, MainError::Driver(DriverError::NotAModule { actual: "program", .. })));
    }

    #[test]
    fn modfile_of_another_module_is_rejected() {
        let mut source = chain();
        let text = source.read_to_string(Path::new(&modfile_name("m3"))).unwrap();
        source.insert(modfile_name("m2"), text);

        let mut asr = Asr::new();
        let err = find_and_load_module(&mut asr, &mut source, &CompilerOptions::default(), "m2", false)
            .unwrap_err();
        assert!(matches!(
            err,
            MainError::Driver(DriverError::WrongModule { name, found }) if name == "m2" && found == "m3"
        ));
        assert!(asr.symtab(asr.global_scope()).is_empty());
    }

    #[test]
    fn standard_modules_come_from_the_runtime_library() {
        let mut lib = Asr::new();
        let module = builder::add_module(&mut lib, "lasr_intrinsic_iso_c_binding", &[]).unwrap();
        let scope = lib.symbol(module).symtab().unwrap();
        builder::add_variable(&mut lib, scope, "c_int", Ttype::int()).unwrap();
        let options = CompilerOptions { runtime_library_dir: "rt".into(), ..Default::default() };
        let mut source = InMemorySource::new();
        source.insert(
            options.runtime_library_dir.join("lasr_intrinsic_iso_c_binding.mod"),
            serialize_module(&lib, module).unwrap(),
        );

        let mut asr = Asr::new();
        let loaded = load_module(&mut asr, &mut source, &options, "iso_c_binding", false).unwrap();
        let m = asr.symbol(loaded).as_module().unwrap();
        assert!(m.intrinsic);
        let c_int = asr.symtab(m.symtab).get("c_int").unwrap();
        assert_eq!(asr.symbol(c_int).as_variable().unwrap().abi, Abi::Intrinsic);
        // the alias resolves to the module that is already there
        let again = load_module(&mut asr, &mut source, &options, "iso_c_binding", false).unwrap();
        assert_eq!(again, loaded);
    }

    #[test]
    fn cyclic_modules_are_rejected() {
        let mut lib = Asr::new();
        let a = builder::add_module(&mut lib, "a", &["b"]).unwrap();
        let b = builder::add_module(&mut lib, "b", &["a"]).unwrap();
        let mut source = InMemorySource::new();
        for (name, module) in [("a", a), ("b", b)] {
            source.insert(modfile_name(name), serialize_module(&lib, module).unwrap());
        }

        let mut asr = Asr::new();
        let err =
            load_module(&mut asr, &mut source, &CompilerOptions::default(), "a", false).unwrap_err();
        assert!(matches!(err, MainError::Asr(AsrError::CyclicDependency { .. })));
    }
}
