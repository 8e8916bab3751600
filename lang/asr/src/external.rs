//! Re-linking of external symbols after modules were loaded or deserialized.

use crate::{Asr, AsrError, AsrResult, HashSet, Symbol, SymbolId};

/// Resolve the target of an external symbol by module name and scope path.
///
/// Chains of external symbols (a module re-exporting what it imported) are followed
/// to the defining symbol, so the result is never itself an `ExternalSymbol`.
pub fn resolve_external(asr: &Asr, ext: SymbolId) -> AsrResult<SymbolId> {
    let global = asr.global_scope();
    let mut current = ext;
    let mut seen = HashSet::default();
    while let Symbol::ExternalSymbol(e) = asr.symbol(current) {
        let unresolved = || AsrError::UnresolvedExternal {
            name: e.original_name.clone(),
            path: std::iter::once(e.module_name.as_str())
                .chain(e.scope_names.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join("::"),
            span: None,
        };
        if !seen.insert(current) {
            return Err(unresolved());
        }
        let module_scope = asr
            .symtab(global)
            .get(&e.module_name)
            .and_then(|m| asr.symbol(m).as_module())
            .map(|m| m.symtab)
            .ok_or_else(unresolved)?;
        current = asr
            .find_scoped(module_scope, &e.original_name, &e.scope_names)
            .map_err(|_| unresolved())?;
    }
    Ok(current)
}

/// Point every external symbol of the translation unit at its target.
pub fn fix_external_symbols(asr: &mut Asr) -> AsrResult {
    let externals: Vec<SymbolId> = asr
        .symbols_in(asr.global_scope())
        .into_iter()
        .filter(|sym| matches!(asr.symbol(*sym), Symbol::ExternalSymbol(_)))
        .collect();
    log::debug!("Linking {} external symbols", externals.len());
    for ext in externals {
        let target = resolve_external(asr, ext)?;
        if let Some(e) = asr.symbol_mut(ext).as_external_mut() {
            e.external = Some(target);
        }
    }
    Ok(())
}
