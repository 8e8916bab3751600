//! Queries over ASR nodes: types, symbol indirection and constant values.

use lasr_lang_miette_util::ToMiette;

use crate::{
    Abi, Asr, AsrError, AsrResult, BinOp, ExprId, ExprKind, HasLocation, Owner, Storage, Symbol,
    SymbolId, SymtabId, Ttype,
};

impl Asr {
    /// Follow an `ExternalSymbol` to the symbol it stands for.
    ///
    /// Unlinked external symbols are returned unchanged.
    pub fn past_external(&self, sym: SymbolId) -> SymbolId {
        match self.symbol(sym) {
            Symbol::ExternalSymbol(ext) => ext.external.unwrap_or(sym),
            _ => sym,
        }
    }

    /// The symbol owning `symtab`, if it is owned by a symbol.
    pub fn owner_symbol(&self, symtab: SymtabId) -> Option<SymbolId> {
        match self.symtab(symtab).owner {
            Owner::Symbol(sym) => Some(sym),
            Owner::TranslationUnit | Owner::Detached => None,
        }
    }

    /// The module a symbol is (transitively) defined in.
    pub fn module_of(&self, sym: SymbolId) -> Option<SymbolId> {
        let mut current = Some(sym);
        while let Some(s) = current {
            if matches!(self.symbol(s), Symbol::Module(_)) {
                return Some(s);
            }
            current = self.parent_symtab(s).and_then(|t| self.owner_symbol(t));
        }
        None
    }

    /// Whether a symbol belongs to the runtime library rather than to user code.
    pub fn is_intrinsic(&self, sym: SymbolId) -> bool {
        let sym = self.past_external(sym);
        let abi_intrinsic = match self.symbol(sym) {
            Symbol::Function(f) => f.abi == Abi::Intrinsic,
            Symbol::Variable(v) => v.abi == Abi::Intrinsic,
            _ => false,
        };
        abi_intrinsic
            || self
                .module_of(sym)
                .and_then(|m| self.symbol(m).as_module())
                .is_some_and(|m| m.intrinsic)
    }

    /// The type of a variable, or the result type of a function.
    pub fn symbol_type(&self, sym: SymbolId) -> Option<&Ttype> {
        match self.symbol(self.past_external(sym)) {
            Symbol::Variable(v) => Some(&v.ty),
            Symbol::Function(f) => f.return_var.and_then(|r| self.expr_type(r)),
            _ => None,
        }
    }

    /// The type of an expression. `None` only for a `Var` naming a symbol without a type.
    pub fn expr_type(&self, expr: ExprId) -> Option<&Ttype> {
        match &self.expr(expr).kind {
            ExprKind::Var { sym } => self.symbol_type(*sym),
            kind => kind.ty(),
        }
    }

    /// The symbol referenced by a `Var` expression.
    pub fn var_symbol(&self, expr: ExprId) -> Option<SymbolId> {
        match self.expr(expr).kind {
            ExprKind::Var { sym } => Some(sym),
            _ => None,
        }
    }

    /// Evaluate an integer expression at compile time, if possible.
    pub fn const_int(&self, expr: ExprId) -> Option<i64> {
        let kind = &self.expr(expr).kind;
        if let Some(value) = kind.value() {
            return self.const_int(value);
        }
        match kind {
            ExprKind::IntegerConstant { n, .. } => Some(*n),
            ExprKind::Var { sym } => match self.symbol(self.past_external(*sym)) {
                Symbol::Variable(v) if v.storage == Storage::Parameter => {
                    v.value.and_then(|value| self.const_int(value))
                }
                _ => None,
            },
            ExprKind::BinOp { left, op, right, .. } => {
                let (l, r) = (self.const_int(*left)?, self.const_int(*right)?);
                match op {
                    BinOp::Add => l.checked_add(r),
                    BinOp::Sub => l.checked_sub(r),
                    BinOp::Mul => l.checked_mul(r),
                    BinOp::Div => l.checked_div(r),
                    BinOp::Pow => u32::try_from(r).ok().and_then(|r| l.checked_pow(r)),
                }
            }
            _ => None,
        }
    }

    /// The compile-time extent of every axis of an array type, if all are known.
    pub fn const_shape(&self, ty: &Ttype) -> Option<Vec<i64>> {
        ty.dims().iter().map(|dim| dim.length.and_then(|len| self.const_int(len))).collect()
    }

    /// Types of the dummy arguments of a function.
    pub fn function_arg_types(&self, func: SymbolId) -> Vec<Option<&Ttype>> {
        match self.symbol(self.past_external(func)) {
            Symbol::Function(f) => f.args.iter().map(|arg| self.expr_type(*arg)).collect(),
            _ => vec![],
        }
    }

    /// The derived type a `Struct` type refers to, past any external symbol.
    pub fn derived_type_of(&self, ty: &Ttype) -> Option<SymbolId> {
        match ty.past_wrappers() {
            Ttype::Struct { derived_type } => Some(self.past_external(*derived_type)),
            _ => None,
        }
    }

    /// A derived type followed by the types it extends, nearest first.
    pub fn struct_type_chain(&self, dt: SymbolId) -> Vec<SymbolId> {
        let mut chain = Vec::new();
        let mut current = Some(self.past_external(dt));
        while let Some(s) = current {
            if chain.contains(&s) {
                break;
            }
            chain.push(s);
            current = self
                .symbol(s)
                .as_struct_type()
                .and_then(|st| st.parent)
                .map(|p| self.past_external(p));
        }
        chain
    }

    /// Members of a derived type, members of parent types first.
    pub fn struct_members(&self, dt: SymbolId) -> Vec<SymbolId> {
        let mut out = Vec::new();
        for ty in self.struct_type_chain(dt).into_iter().rev() {
            if let Symbol::StructType(st) = self.symbol(ty) {
                for member in &st.members {
                    if let Some(sym) = self.symtab(st.symtab).get(member) {
                        out.push(sym);
                    }
                }
            }
        }
        out
    }

    /// Pick the specific procedure of a generic procedure matching the argument types.
    pub fn select_generic_procedure(
        &self,
        generic: SymbolId,
        arg_types: &[Ttype],
    ) -> AsrResult<SymbolId> {
        let generic_sym = self.symbol(self.past_external(generic));
        let Symbol::GenericProcedure(gp) = generic_sym else {
            return Err(AsrError::WrongSymbolKind {
                name: generic_sym.name().to_owned(),
                expected: "generic procedure",
                actual: generic_sym.kind().as_str(),
                span: Some(generic_sym.loc().to_miette()),
            });
        };
        gp.procs
            .iter()
            .copied()
            .find(|proc| {
                let formals = self.function_arg_types(*proc);
                formals.len() == arg_types.len()
                    && formals
                        .iter()
                        .zip(arg_types)
                        .all(|(formal, actual)| formal.is_some_and(|f| f.same_as(actual)))
            })
            .ok_or_else(|| AsrError::NoMatchingProcedure {
                name: gp.name.clone(),
                span: Some(gp.loc.to_miette()),
            })
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::{self, FunctionBuilder};
    use crate::{Intent, Ttype};

    use super::*;

    #[test]
    fn const_int_folds_arithmetic_and_parameters() {
        let mut asr = Asr::new();
        let global = asr.global_scope();
        let five = asr.int(5);
        let n = builder::add_parameter(&mut asr, global, "n", five).unwrap();
        let n = asr.var(n);
        let two = asr.int(2);
        let sum = asr.binop(n, BinOp::Sub, two);
        assert_eq!(asr.const_int(sum), Some(3));

        let x = builder::add_variable(&mut asr, global, "x", Ttype::int()).unwrap();
        let x = asr.var(x);
        let unknown = asr.binop(x, BinOp::Add, two);
        assert_eq!(asr.const_int(unknown), None);
    }

    #[test]
    fn generic_procedure_selects_by_argument_type() {
        let mut asr = Asr::new();
        let global = asr.global_scope();
        let f_int = FunctionBuilder::new(&mut asr, global, "f_int")
            .arg("a", Ttype::int(), Intent::In)
            .finish()
            .unwrap();
        let f_real = FunctionBuilder::new(&mut asr, global, "f_real")
            .arg("a", Ttype::real(), Intent::In)
            .finish()
            .unwrap();
        let generic = builder::add_generic(&mut asr, global, "f", vec![f_int, f_real]).unwrap();

        assert_eq!(asr.select_generic_procedure(generic, &[Ttype::real()]).unwrap(), f_real);
        assert_eq!(asr.select_generic_procedure(generic, &[Ttype::int()]).unwrap(), f_int);
        assert!(matches!(
            asr.select_generic_procedure(generic, &[Ttype::logical()]),
            Err(AsrError::NoMatchingProcedure { .. })
        ));
        assert!(matches!(
            asr.select_generic_procedure(f_int, &[]),
            Err(AsrError::WrongSymbolKind { .. })
        ));
    }

    #[test]
    fn struct_members_list_parent_members_first() {
        let mut asr = Asr::new();
        let global = asr.global_scope();
        let base =
            builder::add_struct_type(&mut asr, global, "base", &[("id", Ttype::int())], None)
                .unwrap();
        let derived = builder::add_struct_type(
            &mut asr,
            global,
            "derived",
            &[("x", Ttype::real())],
            Some(base),
        )
        .unwrap();
        let names: Vec<_> = asr
            .struct_members(derived)
            .into_iter()
            .map(|m| asr.symbol(m).name().to_owned())
            .collect();
        assert_eq!(names, ["id", "x"]);
    }
}
