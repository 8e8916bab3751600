//! Modfiles: compiled modules written to disk so that users of a module do not need its
//! source.
//!
//! The encoding is JSON. Handles do not survive the round trip: symbols are re-associated
//! by the counter of their table and their name, and external symbols come back unlinked
//! so that they can be resolved against whatever scope the module is loaded into.

use lasr_lang_asr::{Asr, Owner, Symbol, SymbolId, SymtabId};

mod dto;
mod read;
mod result;
mod write;

pub use result::*;

use dto::{Header, ModfileDto};
use read::Reader;
use write::Writer;

/// The format string every modfile starts with.
pub const MODFILE_FORMAT: &str = "LASR Modfile";
/// The version written into modfiles; files of other versions are rejected.
pub const MODFILE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Serialize the whole translation unit.
pub fn serialize(asr: &Asr) -> ModfileResult<String> {
    let dto = Writer::new(asr).finish(|_| true, &asr.unit.items, MODFILE_VERSION);
    Ok(serde_json::to_string_pretty(&dto)?)
}

/// Serialize a single module of the translation unit, as if it were the only symbol of
/// the global scope.
pub fn serialize_module(asr: &Asr, module: SymbolId) -> ModfileResult<String> {
    let symbol = asr.symbol(module);
    if !matches!(symbol, Symbol::Module(_)) {
        return Err(ModfileError::NotAModule {
            name: symbol.name().to_owned(),
            actual: symbol.kind().as_str(),
        });
    }
    log::debug!("Writing modfile for module `{}`", symbol.name());
    let dto = Writer::new(asr).finish(|sym| sym == module, &[], MODFILE_VERSION);
    Ok(serde_json::to_string_pretty(&dto)?)
}

/// Serialize a translation unit whose global scope holds exactly one module.
pub fn save_modfile(asr: &Asr) -> ModfileResult<String> {
    let global = asr.symtab(asr.global_scope());
    let mut symbols = global.scope();
    match (symbols.next(), symbols.next()) {
        (Some((_, module)), None) => serialize_module(asr, module),
        _ => Err(ModfileError::NotSingleModule { count: global.len() }),
    }
}

fn parse(text: &str) -> ModfileResult<ModfileDto> {
    let header: Header =
        serde_json::from_str(text).map_err(|_| ModfileError::FormatNotRecognized)?;
    if header.format != MODFILE_FORMAT {
        return Err(ModfileError::FormatNotRecognized);
    }
    if header.version != MODFILE_VERSION {
        return Err(ModfileError::IncompatibleVersion {
            found: header.version,
            expected: MODFILE_VERSION.to_owned(),
        });
    }
    Ok(serde_json::from_str(text)?)
}

/// Read a serialized translation unit into a fresh arena.
///
/// With `load_symtab_id` the tables keep the counters stored in the file, otherwise they
/// are numbered anew.
pub fn deserialize(text: &str, load_symtab_id: bool) -> ModfileResult<Asr> {
    let dto = parse(text)?;
    let mut asr = Asr::new();
    let global = asr.global_scope();
    let items = Reader::new(&mut asr, load_symtab_id).load(&dto, global)?;
    asr.unit.loc = dto.loc;
    asr.unit.items = items;
    Ok(asr)
}

/// Read a modfile into an existing arena.
///
/// The contents of the file's global scope land in a new detached table, which is
/// returned. Loose top-level items of the file are ignored.
pub fn load_modfile(asr: &mut Asr, text: &str, load_symtab_id: bool) -> ModfileResult<SymtabId> {
    let dto = parse(text)?;
    let root = asr.new_symtab(None);
    asr.symtab_mut(root).owner = Owner::Detached;
    Reader::new(asr, load_symtab_id).load(&dto, root)?;
    log::debug!(
        "Loaded modfile fragment with {} top-level symbols at {:?}",
        asr.symtab(root).len(),
        dto.loc
    );
    Ok(root)
}
