use std::path::{Path, PathBuf};

use lasr_lang_asr::deps::determine_module_dependencies;
use lasr_lang_asr::{Asr, Symbol, SymbolId};
use lasr_lang_modfile::{deserialize, serialize_module};
use lasr_lang_passes::PassManager;
use lasr_lang_printer::PrintToString;
use lasr_lang_verify::verify;

use crate::fs::{FileSource, FileSystemSource};
use crate::loader::{self, modfile_name};
use crate::options::CompilerOptions;
use crate::result::{DriverError, MainResult};

/// The state of one compilation: the translation unit being compiled, where modfiles
/// come from, and how to process them.
pub struct Compilation {
    /// The arena holding the translation unit, including every loaded module.
    pub asr: Asr,
    /// The source provider of modfiles (file system or in-memory)
    pub source: Box<dyn FileSource>,
    pub options: CompilerOptions,
    pub pass_manager: PassManager,
}

impl Compilation {
    pub fn new<S: FileSource + 'static>(source: S, mut options: CompilerOptions) -> Self {
        options.pass_options.runtime_library_dir = options.runtime_library_dir.clone();
        Compilation { asr: Asr::new(), source: Box::new(source), options, pass_manager: PassManager::new() }
    }

    /// A compilation reading files relative to the working directory.
    pub fn from_filesystem(options: CompilerOptions) -> Self {
        Self::new(FileSystemSource::new(""), options)
    }

    /// Replace the translation unit by the contents of a modfile.
    ///
    /// External symbols of the file stay unlinked until [`Compilation::link`].
    pub fn open_modfile(&mut self, path: &Path) -> MainResult {
        let text = self.source.read_to_string(path)?;
        self.asr = deserialize(&text, false)?;
        log::debug!(
            "Opened {} with {} top-level symbols",
            path.display(),
            self.asr.symtab(self.asr.global_scope()).len()
        );
        Ok(())
    }

    /// Load every module the translation unit depends on and link its external symbols.
    pub fn link(&mut self) -> MainResult {
        loader::load_dependencies(&mut self.asr, self.source.as_mut(), &self.options)?;
        let name = self.unit_name();
        loader::link(&mut self.asr, &self.options, &name)
    }

    pub fn load_module(&mut self, name: &str, intrinsic: bool) -> MainResult<SymbolId> {
        loader::load_module(&mut self.asr, self.source.as_mut(), &self.options, name, intrinsic)
    }

    pub fn verify(&self) -> MainResult {
        verify(&self.asr, self.options.check_external)?;
        Ok(())
    }

    pub fn apply_passes(&mut self) -> MainResult {
        self.pass_manager.apply_passes(&mut self.asr, &self.options.pass_options)?;
        Ok(())
    }

    /// The modules of the translation unit in the order in which they have to be loaded.
    pub fn module_order(&self) -> MainResult<Vec<String>> {
        Ok(determine_module_dependencies(&self.asr)?)
    }

    /// Write the modfile of module `name` into `dir`, returning its path.
    pub fn save_module(&mut self, name: &str, dir: &Path) -> MainResult<PathBuf> {
        let global = self.asr.global_scope();
        let module = self
            .asr
            .symtab(global)
            .get(name)
            .ok_or_else(|| DriverError::ModuleNotFound { name: name.to_owned() })?;
        let text = serialize_module(&self.asr, module)?;
        let path = dir.join(modfile_name(name));
        self.source.write_string(&path, &text)?;
        log::debug!("Saved module `{name}` to {}", path.display());
        Ok(path)
    }

    pub fn print_to_string(&self) -> String {
        self.asr.print_to_string(None)
    }

    /// Name used in diagnostics about the whole unit: its first program or module.
    fn unit_name(&self) -> String {
        self.asr
            .symtab(self.asr.global_scope())
            .scope()
            .find(|(_, sym)| matches!(self.asr.symbol(*sym), Symbol::Program(_) | Symbol::Module(_)))
            .map(|(name, _)| name.to_owned())
            .unwrap_or_else(|| "translation unit".to_owned())
    }
}

#[cfg(test)]
mod tests {
    use lasr_lang_asr::builder::{self, FunctionBuilder};
    use lasr_lang_asr::{ArrayIndex, StmtKind, Ttype};

    use crate::fs::InMemorySource;

    use super::*;

    /// Module `vectors` with `subroutine shift(x)` assigning `x = y(2:5)`, where `y` is a
    /// module variable; `vectors` depends on `base`.
    fn modfiles() -> InMemorySource {
        let mut asr = Asr::new();
        let base = builder::add_module(&mut asr, "base", &[]).unwrap();
        let vectors = builder::add_module(&mut asr, "vectors", &["base"]).unwrap();
        let scope = asr.symbol(vectors).symtab().unwrap();
        let y_ty = builder::array_of(&mut asr, Ttype::real(), &[10]);
        let y = builder::add_variable(&mut asr, scope, "y", y_ty).unwrap();
        let x_ty = builder::array_of(&mut asr, Ttype::real(), &[4]);
        let shift = FunctionBuilder::new(&mut asr, scope, "shift").local("x", x_ty).finish().unwrap();
        let shift_scope = asr.symbol(shift).symtab().unwrap();
        let x = asr.symtab(shift_scope).get("x").unwrap();
        let (x, y) = (asr.var(x), asr.var(y));
        let (lo, hi) = (asr.int(2), asr.int(5));
        let section = asr.section(y, vec![ArrayIndex { left: Some(lo), right: Some(hi), step: None }]);
        let assign = asr.assign(x, section);
        builder::push_stmt(&mut asr, shift, assign);

        let mut source = InMemorySource::new();
        for (name, module) in [("base", base), ("vectors", vectors)] {
            source.insert(modfile_name(name), serialize_module(&asr, module).unwrap());
        }
        source
    }

    fn opened() -> Compilation {
        let mut compilation = Compilation::new(modfiles(), CompilerOptions::default());
        compilation.open_modfile(Path::new("vectors.mod")).unwrap();
        compilation.link().unwrap();
        compilation
    }

    #[test]
    fn linking_loads_dependencies() {
        let compilation = opened();
        assert_eq!(compilation.module_order().unwrap(), ["base", "vectors"]);
        compilation.verify().unwrap();
    }

    #[test]
    fn passes_lower_sections() {
        let mut compilation = opened();
        compilation.apply_passes().unwrap();
        compilation.verify().unwrap();

        let global = compilation.asr.global_scope();
        let vectors = compilation.asr.symtab(global).get("vectors").unwrap();
        let scope = compilation.asr.symbol(vectors).symtab().unwrap();
        let shift = compilation.asr.symtab(scope).get("shift").unwrap();
        let body = compilation.asr.symbol(shift).body().unwrap();
        assert!(matches!(compilation.asr.stmt(body[0]).kind, StmtKind::DoLoop { .. }));
    }

    #[test]
    fn saved_modules_open_again() {
        let mut compilation = opened();
        let printed = compilation.print_to_string();
        let path = compilation.save_module("vectors", Path::new("out")).unwrap();
        assert_eq!(path, Path::new("out/vectors.mod"));

        let mut reopened = Compilation {
            source: compilation.source,
            ..Compilation::new(InMemorySource::new(), CompilerOptions::default())
        };
        reopened.open_modfile(&path).unwrap();
        reopened.link().unwrap();
        assert!(reopened.print_to_string().contains("shift"));
        assert!(printed.contains("shift"));
    }

    #[test]
    fn unknown_modules_cannot_be_saved() {
        let mut compilation = opened();
        assert!(compilation.save_module("nope", Path::new("")).is_err());
    }
}
