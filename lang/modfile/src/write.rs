use lasr_lang_asr::{
    Allocation, ArrayIndex, Asr, Dimension, ExprId, ExprKind, HashMap, Item, StmtId, StmtKind,
    Symbol, SymbolId, SymtabId, Ttype,
};

use crate::dto::*;

/// Converts the part of an arena reachable from one table into its file representation.
pub(crate) struct Writer<'a> {
    asr: &'a Asr,
    symtabs: Vec<SymtabDto>,
    exprs: Vec<Option<ExprDto>>,
    stmts: Vec<Option<StmtDto>>,
    expr_refs: HashMap<ExprId, ExprRef>,
    stmt_refs: HashMap<StmtId, StmtRef>,
}

impl<'a> Writer<'a> {
    pub(crate) fn new(asr: &'a Asr) -> Self {
        Writer {
            asr,
            symtabs: Vec::new(),
            exprs: Vec::new(),
            stmts: Vec::new(),
            expr_refs: HashMap::default(),
            stmt_refs: HashMap::default(),
        }
    }

    /// Write the global scope, keeping only the top-level symbols accepted by `keep`, and
    /// the loose items of the translation unit.
    pub(crate) fn finish<F>(mut self, keep: F, items: &[Item], version: &str) -> ModfileDto
    where
        F: Fn(SymbolId) -> bool,
    {
        let global = self.asr.global_scope();
        self.symtab(global, &keep);
        let items = items
            .iter()
            .map(|item| match item {
                Item::Stmt(s) => ItemDto::Stmt(self.stmt(*s)),
                Item::Expr(e) => ItemDto::Expr(self.expr(*e)),
            })
            .collect();
        ModfileDto {
            format: crate::MODFILE_FORMAT.to_owned(),
            version: version.to_owned(),
            loc: self.asr.unit.loc,
            global_scope: self.asr.symtab(global).counter,
            symtabs: self.symtabs,
            exprs: self.exprs.into_iter().flatten().collect(),
            stmts: self.stmts.into_iter().flatten().collect(),
            items,
        }
    }

    fn symtab(&mut self, id: SymtabId, keep: &dyn Fn(SymbolId) -> bool) {
        let asr = self.asr;
        let table = asr.symtab(id);
        let mut dto = SymtabDto {
            counter: table.counter,
            parent: table.parent.map(|p| asr.symtab(p).counter),
            symbols: Default::default(),
            aliases: Default::default(),
        };
        for (name, sym) in table.scope() {
            if !keep(sym) {
                continue;
            }
            if asr.parent_symtab(sym) == Some(id) {
                let symbol = self.symbol(sym);
                dto.symbols.insert(name.to_owned(), symbol);
            } else {
                dto.aliases.insert(name.to_owned(), self.sym_ref(sym));
            }
        }
        self.symtabs.push(dto);
    }

    fn nested(&mut self, id: SymtabId) -> u64 {
        self.symtab(id, &|_| true);
        self.asr.symtab(id).counter
    }

    fn sym_ref(&self, sym: SymbolId) -> SymRef {
        let name = self.asr.symbol(sym).name();
        match self.asr.parent_symtab(sym) {
            Some(parent) => {
                let table = self.asr.symtab(parent);
                // A symbol is normally registered under its own name.
                let name = if table.get(name) == Some(sym) {
                    name.to_owned()
                } else {
                    table
                        .scope()
                        .find(|(_, s)| *s == sym)
                        .map(|(n, _)| n.to_owned())
                        .unwrap_or_else(|| name.to_owned())
                };
                SymRef { symtab: table.counter, name }
            }
            None => SymRef { symtab: 0, name: name.to_owned() },
        }
    }

    fn symbol(&mut self, sym: SymbolId) -> SymbolDto {
        let asr = self.asr;
        match asr.symbol(sym) {
            Symbol::Program(x) => SymbolDto::Program {
                loc: x.loc,
                symtab: self.nested(x.symtab),
                name: x.name.clone(),
                dependencies: x.dependencies.clone(),
                body: self.body(&x.body),
            },
            Symbol::Module(x) => SymbolDto::Module {
                loc: x.loc,
                symtab: self.nested(x.symtab),
                name: x.name.clone(),
                dependencies: x.dependencies.clone(),
                loaded_from_mod: x.loaded_from_mod,
                intrinsic: x.intrinsic,
            },
            Symbol::Function(x) => SymbolDto::Function {
                loc: x.loc,
                symtab: self.nested(x.symtab),
                name: x.name.clone(),
                args: x.args.iter().map(|a| self.expr(*a)).collect(),
                body: self.body(&x.body),
                return_var: x.return_var.map(|r| self.expr(r)),
                dependencies: x.dependencies.clone(),
                type_params: x.type_params.clone(),
                abi: x.abi,
                access: x.access,
                deftype: x.deftype,
                inline: x.inline,
            },
            Symbol::GenericProcedure(x) => SymbolDto::GenericProcedure {
                loc: x.loc,
                name: x.name.clone(),
                procs: x.procs.iter().map(|p| self.sym_ref(*p)).collect(),
                access: x.access,
            },
            Symbol::Variable(x) => SymbolDto::Variable {
                loc: x.loc,
                name: x.name.clone(),
                intent: x.intent,
                symbolic_value: x.symbolic_value.map(|e| self.expr(e)),
                value: x.value.map(|e| self.expr(e)),
                storage: x.storage,
                ty: self.ttype(&x.ty),
                abi: x.abi,
                access: x.access,
            },
            Symbol::StructType(x) => SymbolDto::StructType {
                loc: x.loc,
                symtab: self.nested(x.symtab),
                name: x.name.clone(),
                dependencies: x.dependencies.clone(),
                members: x.members.clone(),
                abi: x.abi,
                access: x.access,
                parent: x.parent.map(|p| self.sym_ref(p)),
            },
            Symbol::ExternalSymbol(x) => SymbolDto::ExternalSymbol {
                loc: x.loc,
                name: x.name.clone(),
                module_name: x.module_name.clone(),
                scope_names: x.scope_names.clone(),
                original_name: x.original_name.clone(),
                access: x.access,
            },
            Symbol::ClassProcedure(x) => SymbolDto::ClassProcedure {
                loc: x.loc,
                name: x.name.clone(),
                self_argument: x.self_argument.clone(),
                proc_name: x.proc_name.clone(),
                proc: self.sym_ref(x.proc),
                abi: x.abi,
            },
            Symbol::Block(x) => SymbolDto::Block {
                loc: x.loc,
                symtab: self.nested(x.symtab),
                name: x.name.clone(),
                body: self.body(&x.body),
            },
        }
    }

    fn ttype(&mut self, ty: &Ttype) -> TtypeDto {
        match ty {
            Ttype::Integer { kind } => TtypeDto::Integer { kind: *kind },
            Ttype::Real { kind } => TtypeDto::Real { kind: *kind },
            Ttype::Complex { kind } => TtypeDto::Complex { kind: *kind },
            Ttype::Logical { kind } => TtypeDto::Logical { kind: *kind },
            Ttype::Character { kind, len } => TtypeDto::Character { kind: *kind, len: *len },
            Ttype::Struct { derived_type } => {
                TtypeDto::Struct { derived_type: self.sym_ref(*derived_type) }
            }
            Ttype::TypeParameter { param } => TtypeDto::TypeParameter { param: param.clone() },
            Ttype::Array { elem, dims } => TtypeDto::Array {
                elem: Box::new(self.ttype(elem)),
                dims: self.dims(dims),
            },
            Ttype::Pointer(inner) => TtypeDto::Pointer(Box::new(self.ttype(inner))),
            Ttype::Allocatable(inner) => TtypeDto::Allocatable(Box::new(self.ttype(inner))),
            Ttype::List(inner) => TtypeDto::List(Box::new(self.ttype(inner))),
            Ttype::Tuple(elems) => TtypeDto::Tuple(elems.iter().map(|t| self.ttype(t)).collect()),
        }
    }

    fn dims(&mut self, dims: &[Dimension]) -> Vec<DimensionDto> {
        dims.iter()
            .map(|d| DimensionDto { start: self.opt(d.start), length: self.opt(d.length) })
            .collect()
    }

    fn indices(&mut self, args: &[ArrayIndex]) -> Vec<ArrayIndexDto> {
        args.iter()
            .map(|i| ArrayIndexDto {
                left: self.opt(i.left),
                right: self.opt(i.right),
                step: self.opt(i.step),
            })
            .collect()
    }

    fn opt(&mut self, expr: Option<ExprId>) -> Option<ExprRef> {
        expr.map(|e| self.expr(e))
    }

    fn all(&mut self, exprs: &[ExprId]) -> Vec<ExprRef> {
        exprs.iter().map(|e| self.expr(*e)).collect()
    }

    fn args(&mut self, args: &[Option<ExprId>]) -> Vec<Option<ExprRef>> {
        args.iter().map(|a| self.opt(*a)).collect()
    }

    fn expr(&mut self, id: ExprId) -> ExprRef {
        if let Some(r) = self.expr_refs.get(&id) {
            return *r;
        }
        let idx = self.exprs.len() as ExprRef;
        self.exprs.push(None);
        self.expr_refs.insert(id, idx);

        let asr = self.asr;
        let expr = asr.expr(id);
        use ExprKind::*;
        let kind = match &expr.kind {
            IntegerConstant { n, ty } => ExprKindDto::IntegerConstant { n: *n, ty: self.ttype(ty) },
            RealConstant { r, ty } => ExprKindDto::RealConstant { r: *r, ty: self.ttype(ty) },
            LogicalConstant { value, ty } => {
                ExprKindDto::LogicalConstant { value: *value, ty: self.ttype(ty) }
            }
            StringConstant { s, ty } => {
                ExprKindDto::StringConstant { s: s.clone(), ty: self.ttype(ty) }
            }
            Var { sym } => ExprKindDto::Var { sym: self.sym_ref(*sym) },
            BinOp { left, op, right, ty, value } => ExprKindDto::BinOp {
                left: self.expr(*left),
                op: *op,
                right: self.expr(*right),
                ty: self.ttype(ty),
                value: self.opt(*value),
            },
            Compare { left, op, right, ty, value } => ExprKindDto::Compare {
                left: self.expr(*left),
                op: *op,
                right: self.expr(*right),
                ty: self.ttype(ty),
                value: self.opt(*value),
            },
            LogicalBinOp { left, op, right, ty, value } => ExprKindDto::LogicalBinOp {
                left: self.expr(*left),
                op: *op,
                right: self.expr(*right),
                ty: self.ttype(ty),
                value: self.opt(*value),
            },
            LogicalNot { arg, ty, value } => ExprKindDto::LogicalNot {
                arg: self.expr(*arg),
                ty: self.ttype(ty),
                value: self.opt(*value),
            },
            Cast { arg, kind, ty, value } => ExprKindDto::Cast {
                arg: self.expr(*arg),
                kind: *kind,
                ty: self.ttype(ty),
                value: self.opt(*value),
            },
            FunctionCall { name, original_name, args, ty, value, dt } => {
                ExprKindDto::FunctionCall {
                    name: self.sym_ref(*name),
                    original_name: original_name.map(|o| self.sym_ref(o)),
                    args: self.args(args),
                    ty: self.ttype(ty),
                    value: self.opt(*value),
                    dt: self.opt(*dt),
                }
            }
            ArrayItem { v, args, ty } => ExprKindDto::ArrayItem {
                v: self.expr(*v),
                args: self.indices(args),
                ty: self.ttype(ty),
            },
            ArraySection { v, args, ty } => ExprKindDto::ArraySection {
                v: self.expr(*v),
                args: self.indices(args),
                ty: self.ttype(ty),
            },
            ArrayConstant { args, ty } => {
                ExprKindDto::ArrayConstant { args: self.all(args), ty: self.ttype(ty) }
            }
            ImpliedDoLoop { values, var, start, end, increment, ty } => {
                ExprKindDto::ImpliedDoLoop {
                    values: self.all(values),
                    var: self.expr(*var),
                    start: self.expr(*start),
                    end: self.expr(*end),
                    increment: self.opt(*increment),
                    ty: self.ttype(ty),
                }
            }
            ArrayBound { v, dim, bound, ty, value } => ExprKindDto::ArrayBound {
                v: self.expr(*v),
                dim: self.opt(*dim),
                bound: *bound,
                ty: self.ttype(ty),
                value: self.opt(*value),
            },
            ArraySize { v, dim, ty, value } => ExprKindDto::ArraySize {
                v: self.expr(*v),
                dim: self.opt(*dim),
                ty: self.ttype(ty),
                value: self.opt(*value),
            },
            Allocated { v, ty } => ExprKindDto::Allocated { v: self.expr(*v), ty: self.ttype(ty) },
            StructInstanceMember { v, member, ty } => ExprKindDto::StructInstanceMember {
                v: self.expr(*v),
                member: self.sym_ref(*member),
                ty: self.ttype(ty),
            },
            StructConstructor { dt_sym, args, ty } => ExprKindDto::StructConstructor {
                dt_sym: self.sym_ref(*dt_sym),
                args: self.args(args),
                ty: self.ttype(ty),
            },
            ListConstant { args, ty } => {
                ExprKindDto::ListConstant { args: self.all(args), ty: self.ttype(ty) }
            }
            ListLen { arg, ty } => ExprKindDto::ListLen { arg: self.expr(*arg), ty: self.ttype(ty) },
            ListItem { a, pos, ty } => ExprKindDto::ListItem {
                a: self.expr(*a),
                pos: self.expr(*pos),
                ty: self.ttype(ty),
            },
            TupleConstant { elements, ty } => {
                ExprKindDto::TupleConstant { elements: self.all(elements), ty: self.ttype(ty) }
            }
            TupleItem { a, pos, ty } => ExprKindDto::TupleItem {
                a: self.expr(*a),
                pos: self.expr(*pos),
                ty: self.ttype(ty),
            },
        };
        self.exprs[idx as usize] = Some(ExprDto { loc: expr.loc, kind });
        idx
    }

    fn body(&mut self, body: &[StmtId]) -> Vec<StmtRef> {
        body.iter().map(|s| self.stmt(*s)).collect()
    }

    fn stmt(&mut self, id: StmtId) -> StmtRef {
        if let Some(r) = self.stmt_refs.get(&id) {
            return *r;
        }
        let idx = self.stmts.len() as StmtRef;
        self.stmts.push(None);
        self.stmt_refs.insert(id, idx);

        let asr = self.asr;
        let stmt = asr.stmt(id);
        let kind = match &stmt.kind {
            StmtKind::Assignment { target, value } => {
                StmtKindDto::Assignment { target: self.expr(*target), value: self.expr(*value) }
            }
            StmtKind::DoLoop { head, body } => StmtKindDto::DoLoop {
                v: self.expr(head.v),
                start: self.expr(head.start),
                end: self.expr(head.end),
                increment: self.opt(head.increment),
                body: self.body(body),
            },
            StmtKind::If { test, body, orelse } => StmtKindDto::If {
                test: self.expr(*test),
                body: self.body(body),
                orelse: self.body(orelse),
            },
            StmtKind::Where { test, body, orelse } => StmtKindDto::Where {
                test: self.expr(*test),
                body: self.body(body),
                orelse: self.body(orelse),
            },
            StmtKind::Print { values, separator, end } => StmtKindDto::Print {
                values: self.all(values),
                separator: self.opt(*separator),
                end: self.opt(*end),
            },
            StmtKind::SubroutineCall { name, original_name, args, dt } => {
                StmtKindDto::SubroutineCall {
                    name: self.sym_ref(*name),
                    original_name: original_name.map(|o| self.sym_ref(o)),
                    args: self.args(args),
                    dt: self.opt(*dt),
                }
            }
            StmtKind::Return => StmtKindDto::Return,
            StmtKind::Exit => StmtKindDto::Exit,
            StmtKind::Cycle => StmtKindDto::Cycle,
            StmtKind::GoTo { target_id, name } => {
                StmtKindDto::GoTo { target_id: *target_id, name: name.clone() }
            }
            StmtKind::BlockCall { label, m } => {
                StmtKindDto::BlockCall { label: *label, m: self.sym_ref(*m) }
            }
            StmtKind::Allocate { args } => StmtKindDto::Allocate {
                args: args
                    .iter()
                    .map(|Allocation { a, dims }| AllocationDto {
                        a: self.expr(*a),
                        dims: self.dims(dims),
                    })
                    .collect(),
            },
            StmtKind::ExplicitDeallocate { vars } => {
                StmtKindDto::ExplicitDeallocate { vars: self.all(vars) }
            }
        };
        self.stmts[idx as usize] = Some(StmtDto { loc: stmt.loc, kind });
        idx
    }
}
