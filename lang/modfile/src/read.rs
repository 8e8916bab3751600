use lasr_lang_asr::builder::variable;
use lasr_lang_asr::*;

use crate::dto::*;
use crate::{ModfileError, ModfileResult};

/// Rebuilds arena nodes from a modfile.
///
/// Loading happens in phases. Tables are created first, then every symbol is registered
/// as a placeholder of the right variant, and finally every node is overwritten in place
/// with its real contents. References can therefore point at symbols which are read
/// later without any handle changing.
pub(crate) struct Reader<'a> {
    asr: &'a mut Asr,
    load_symtab_id: bool,
    symtabs: HashMap<u64, SymtabId>,
    symbols: HashMap<SymRef, SymbolId>,
    exprs: Vec<ExprId>,
    stmts: Vec<StmtId>,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(asr: &'a mut Asr, load_symtab_id: bool) -> Self {
        Reader {
            asr,
            load_symtab_id,
            symtabs: HashMap::default(),
            symbols: HashMap::default(),
            exprs: Vec::new(),
            stmts: Vec::new(),
        }
    }

    /// Load the contents of `dto` with its root table mapped onto `root`.
    pub(crate) fn load(&mut self, dto: &ModfileDto, root: SymtabId) -> ModfileResult<Vec<Item>> {
        self.tables(dto, root)?;
        self.reserve(dto);
        // Scope owners first, so that every table knows its owner afterwards.
        for owning in [true, false] {
            for table in &dto.symtabs {
                self.declare(table, owning)?;
            }
        }
        for table in &dto.symtabs {
            self.aliases(table)?;
        }
        for (idx, expr) in dto.exprs.iter().enumerate() {
            let (id, kind) = (self.exprs[idx], self.expr_kind(&expr.kind)?);
            *self.asr.expr_mut(id) = Expr { loc: expr.loc, kind };
        }
        for (idx, stmt) in dto.stmts.iter().enumerate() {
            let (id, kind) = (self.stmts[idx], self.stmt_kind(&stmt.kind)?);
            *self.asr.stmt_mut(id) = Stmt { loc: stmt.loc, kind };
        }
        for table in &dto.symtabs {
            let scope = self.symtabs[&table.counter];
            for (name, symbol) in &table.symbols {
                let id = self.symbols[&SymRef { symtab: table.counter, name: name.clone() }];
                let full = self.symbol(symbol, scope)?;
                *self.asr.symbol_mut(id) = full;
            }
        }
        log::trace!(
            "Loaded {} tables, {} expressions and {} statements",
            dto.symtabs.len(),
            dto.exprs.len(),
            dto.stmts.len()
        );
        dto.items
            .iter()
            .map(|item| {
                Ok(match item {
                    ItemDto::Stmt(s) => Item::Stmt(self.stmt(*s)?),
                    ItemDto::Expr(e) => Item::Expr(self.expr(*e)?),
                })
            })
            .collect()
    }

    fn tables(&mut self, dto: &ModfileDto, root: SymtabId) -> ModfileResult {
        for table in &dto.symtabs {
            let id = if table.counter == dto.global_scope {
                if self.load_symtab_id {
                    self.asr.symtab_mut(root).counter = table.counter;
                }
                root
            } else if self.load_symtab_id {
                self.asr.new_symtab_with_counter(table.counter, None)
            } else {
                self.asr.new_symtab(None)
            };
            if self.symtabs.insert(table.counter, id).is_some() {
                return Err(ModfileError::malformed(format!(
                    "symbol table counter {} occurs twice",
                    table.counter
                )));
            }
        }
        if !self.symtabs.contains_key(&dto.global_scope) {
            return Err(ModfileError::malformed("the root symbol table is missing"));
        }
        for table in &dto.symtabs {
            if table.counter == dto.global_scope {
                continue;
            }
            let parent = match table.parent {
                Some(p) => Some(self.table(p)?),
                None => None,
            };
            let id = self.symtabs[&table.counter];
            self.asr.symtab_mut(id).parent = parent;
        }
        Ok(())
    }

    fn reserve(&mut self, dto: &ModfileDto) {
        self.exprs = dto
            .exprs
            .iter()
            .map(|e| self.asr.add_expr(e.loc, ExprKind::IntegerConstant { n: 0, ty: Ttype::int() }))
            .collect();
        self.stmts = dto.stmts.iter().map(|s| self.asr.add_stmt(s.loc, StmtKind::Return)).collect();
    }

    fn declare(&mut self, table: &SymtabDto, owning: bool) -> ModfileResult {
        let scope = self.symtabs[&table.counter];
        for (name, symbol) in &table.symbols {
            if symbol.symtab().is_some() != owning {
                continue;
            }
            let placeholder = self.placeholder(symbol, scope)?;
            let id = self.asr.alloc_symbol(placeholder);
            self.asr.insert_symbol(scope, name, id)?;
            self.symbols.insert(SymRef { symtab: table.counter, name: name.clone() }, id);
        }
        Ok(())
    }

    fn aliases(&mut self, table: &SymtabDto) -> ModfileResult {
        let scope = self.symtabs[&table.counter];
        for (name, target) in &table.aliases {
            let target = self.sym(target)?;
            self.asr.insert_symbol(scope, name, target)?;
        }
        Ok(())
    }

    fn table(&self, counter: u64) -> ModfileResult<SymtabId> {
        self.symtabs.get(&counter).copied().ok_or_else(|| {
            ModfileError::malformed(format!("reference to unknown symbol table {counter}"))
        })
    }

    fn sym(&self, r: &SymRef) -> ModfileResult<SymbolId> {
        self.symbols.get(r).copied().ok_or_else(|| ModfileError::DanglingReference {
            symtab: r.symtab,
            name: r.name.clone(),
        })
    }

    fn expr(&self, r: ExprRef) -> ModfileResult<ExprId> {
        self.exprs.get(r as usize).copied().ok_or_else(|| {
            ModfileError::malformed(format!("reference to unknown expression {r}"))
        })
    }

    fn stmt(&self, r: StmtRef) -> ModfileResult<StmtId> {
        self.stmts
            .get(r as usize)
            .copied()
            .ok_or_else(|| ModfileError::malformed(format!("reference to unknown statement {r}")))
    }

    fn opt(&self, r: Option<ExprRef>) -> ModfileResult<Option<ExprId>> {
        r.map(|r| self.expr(r)).transpose()
    }

    fn all(&self, refs: &[ExprRef]) -> ModfileResult<Vec<ExprId>> {
        refs.iter().map(|r| self.expr(*r)).collect()
    }

    fn args(&self, refs: &[Option<ExprRef>]) -> ModfileResult<Vec<Option<ExprId>>> {
        refs.iter().map(|r| self.opt(*r)).collect()
    }

    fn body(&self, refs: &[StmtRef]) -> ModfileResult<Vec<StmtId>> {
        refs.iter().map(|r| self.stmt(*r)).collect()
    }

    /// A symbol of the same variant as `dto` carrying its name and table links, with all
    /// references to other nodes left empty.
    fn placeholder(&self, dto: &SymbolDto, scope: SymtabId) -> ModfileResult<Symbol> {
        let loc = Location::initial();
        Ok(match dto {
            SymbolDto::Program { symtab, name, .. } => Program {
                loc,
                symtab: self.table(*symtab)?,
                name: name.clone(),
                dependencies: vec![],
                body: vec![],
            }
            .into(),
            SymbolDto::Module { symtab, name, .. } => Module {
                loc,
                symtab: self.table(*symtab)?,
                name: name.clone(),
                dependencies: vec![],
                loaded_from_mod: false,
                intrinsic: false,
            }
            .into(),
            SymbolDto::Function { symtab, name, .. } => Function {
                loc,
                symtab: self.table(*symtab)?,
                name: name.clone(),
                args: vec![],
                body: vec![],
                return_var: None,
                dependencies: vec![],
                type_params: vec![],
                abi: Abi::Source,
                access: Access::Public,
                deftype: DefType::Implementation,
                inline: false,
            }
            .into(),
            SymbolDto::GenericProcedure { name, .. } => GenericProcedure {
                loc,
                parent_symtab: scope,
                name: name.clone(),
                procs: vec![],
                access: Access::Public,
            }
            .into(),
            SymbolDto::Variable { name, .. } => variable(scope, name, Ttype::int()).into(),
            SymbolDto::StructType { symtab, name, .. } => StructType {
                loc,
                symtab: self.table(*symtab)?,
                name: name.clone(),
                dependencies: vec![],
                members: vec![],
                abi: Abi::Source,
                access: Access::Public,
                parent: None,
            }
            .into(),
            SymbolDto::ExternalSymbol { name, .. } => ExternalSymbol {
                loc,
                parent_symtab: scope,
                name: name.clone(),
                external: None,
                module_name: String::new(),
                scope_names: vec![],
                original_name: String::new(),
                access: Access::Public,
            }
            .into(),
            SymbolDto::ClassProcedure { name, proc_name, .. } => {
                // The bound procedure may not be declared yet; point at the derived type
                // owning this table until the real contents are filled in.
                let anchor = self.asr.owner_symbol(scope).ok_or_else(|| {
                    ModfileError::malformed(format!(
                        "class procedure `{name}` outside of a derived type"
                    ))
                })?;
                ClassProcedure {
                    loc,
                    parent_symtab: scope,
                    name: name.clone(),
                    self_argument: None,
                    proc_name: proc_name.clone(),
                    proc: anchor,
                    abi: Abi::Source,
                }
                .into()
            }
            SymbolDto::Block { symtab, name, .. } => {
                Block { loc, symtab: self.table(*symtab)?, name: name.clone(), body: vec![] }
                    .into()
            }
        })
    }

    fn symbol(&self, dto: &SymbolDto, scope: SymtabId) -> ModfileResult<Symbol> {
        Ok(match dto {
            SymbolDto::Program { loc, symtab, name, dependencies, body } => Program {
                loc: *loc,
                symtab: self.table(*symtab)?,
                name: name.clone(),
                dependencies: dependencies.clone(),
                body: self.body(body)?,
            }
            .into(),
            SymbolDto::Module { loc, symtab, name, dependencies, loaded_from_mod, intrinsic } => {
                Module {
                    loc: *loc,
                    symtab: self.table(*symtab)?,
                    name: name.clone(),
                    dependencies: dependencies.clone(),
                    loaded_from_mod: *loaded_from_mod,
                    intrinsic: *intrinsic,
                }
                .into()
            }
            SymbolDto::Function {
                loc,
                symtab,
                name,
                args,
                body,
                return_var,
                dependencies,
                type_params,
                abi,
                access,
                deftype,
                inline,
            } => Function {
                loc: *loc,
                symtab: self.table(*symtab)?,
                name: name.clone(),
                args: self.all(args)?,
                body: self.body(body)?,
                return_var: self.opt(*return_var)?,
                dependencies: dependencies.clone(),
                type_params: type_params.clone(),
                abi: *abi,
                access: *access,
                deftype: *deftype,
                inline: *inline,
            }
            .into(),
            SymbolDto::GenericProcedure { loc, name, procs, access } => GenericProcedure {
                loc: *loc,
                parent_symtab: scope,
                name: name.clone(),
                procs: procs.iter().map(|p| self.sym(p)).collect::<ModfileResult<_>>()?,
                access: *access,
            }
            .into(),
            SymbolDto::Variable {
                loc,
                name,
                intent,
                symbolic_value,
                value,
                storage,
                ty,
                abi,
                access,
            } => Variable {
                loc: *loc,
                parent_symtab: scope,
                name: name.clone(),
                intent: *intent,
                symbolic_value: self.opt(*symbolic_value)?,
                value: self.opt(*value)?,
                storage: *storage,
                ty: self.ttype(ty)?,
                abi: *abi,
                access: *access,
            }
            .into(),
            SymbolDto::StructType {
                loc,
                symtab,
                name,
                dependencies,
                members,
                abi,
                access,
                parent,
            } => StructType {
                loc: *loc,
                symtab: self.table(*symtab)?,
                name: name.clone(),
                dependencies: dependencies.clone(),
                members: members.clone(),
                abi: *abi,
                access: *access,
                parent: parent.as_ref().map(|p| self.sym(p)).transpose()?,
            }
            .into(),
            SymbolDto::ExternalSymbol {
                loc,
                name,
                module_name,
                scope_names,
                original_name,
                access,
            } => ExternalSymbol {
                loc: *loc,
                parent_symtab: scope,
                name: name.clone(),
                external: None,
                module_name: module_name.clone(),
                scope_names: scope_names.clone(),
                original_name: original_name.clone(),
                access: *access,
            }
            .into(),
            SymbolDto::ClassProcedure { loc, name, self_argument, proc_name, proc, abi } => {
                ClassProcedure {
                    loc: *loc,
                    parent_symtab: scope,
                    name: name.clone(),
                    self_argument: self_argument.clone(),
                    proc_name: proc_name.clone(),
                    proc: self.sym(proc)?,
                    abi: *abi,
                }
                .into()
            }
            SymbolDto::Block { loc, symtab, name, body } => Block {
                loc: *loc,
                symtab: self.table(*symtab)?,
                name: name.clone(),
                body: self.body(body)?,
            }
            .into(),
        })
    }

    fn ttype(&self, dto: &TtypeDto) -> ModfileResult<Ttype> {
        Ok(match dto {
            TtypeDto::Integer { kind } => Ttype::Integer { kind: *kind },
            TtypeDto::Real { kind } => Ttype::Real { kind: *kind },
            TtypeDto::Complex { kind } => Ttype::Complex { kind: *kind },
            TtypeDto::Logical { kind } => Ttype::Logical { kind: *kind },
            TtypeDto::Character { kind, len } => Ttype::Character { kind: *kind, len: *len },
            TtypeDto::Struct { derived_type } => {
                Ttype::Struct { derived_type: self.sym(derived_type)? }
            }
            TtypeDto::TypeParameter { param } => Ttype::TypeParameter { param: param.clone() },
            TtypeDto::Array { elem, dims } => {
                Ttype::Array { elem: Box::new(self.ttype(elem)?), dims: self.dims(dims)? }
            }
            TtypeDto::Pointer(inner) => Ttype::Pointer(Box::new(self.ttype(inner)?)),
            TtypeDto::Allocatable(inner) => Ttype::Allocatable(Box::new(self.ttype(inner)?)),
            TtypeDto::List(inner) => Ttype::List(Box::new(self.ttype(inner)?)),
            TtypeDto::Tuple(elems) => {
                Ttype::Tuple(elems.iter().map(|t| self.ttype(t)).collect::<ModfileResult<_>>()?)
            }
        })
    }

    fn dims(&self, dims: &[DimensionDto]) -> ModfileResult<Vec<Dimension>> {
        dims.iter()
            .map(|d| Ok(Dimension { start: self.opt(d.start)?, length: self.opt(d.length)? }))
            .collect()
    }

    fn indices(&self, args: &[ArrayIndexDto]) -> ModfileResult<Vec<ArrayIndex>> {
        args.iter()
            .map(|i| {
                Ok(ArrayIndex {
                    left: self.opt(i.left)?,
                    right: self.opt(i.right)?,
                    step: self.opt(i.step)?,
                })
            })
            .collect()
    }

    fn expr_kind(&self, dto: &ExprKindDto) -> ModfileResult<ExprKind> {
        use ExprKindDto as D;
        Ok(match dto {
            D::IntegerConstant { n, ty } => ExprKind::IntegerConstant { n: *n, ty: self.ttype(ty)? },
            D::RealConstant { r, ty } => ExprKind::RealConstant { r: *r, ty: self.ttype(ty)? },
            D::LogicalConstant { value, ty } => {
                ExprKind::LogicalConstant { value: *value, ty: self.ttype(ty)? }
            }
            D::StringConstant { s, ty } => {
                ExprKind::StringConstant { s: s.clone(), ty: self.ttype(ty)? }
            }
            D::Var { sym } => ExprKind::Var { sym: self.sym(sym)? },
            D::BinOp { left, op, right, ty, value } => ExprKind::BinOp {
                left: self.expr(*left)?,
                op: *op,
                right: self.expr(*right)?,
                ty: self.ttype(ty)?,
                value: self.opt(*value)?,
            },
            D::Compare { left, op, right, ty, value } => ExprKind::Compare {
                left: self.expr(*left)?,
                op: *op,
                right: self.expr(*right)?,
                ty: self.ttype(ty)?,
                value: self.opt(*value)?,
            },
            D::LogicalBinOp { left, op, right, ty, value } => ExprKind::LogicalBinOp {
                left: self.expr(*left)?,
                op: *op,
                right: self.expr(*right)?,
                ty: self.ttype(ty)?,
                value: self.opt(*value)?,
            },
            D::LogicalNot { arg, ty, value } => ExprKind::LogicalNot {
                arg: self.expr(*arg)?,
                ty: self.ttype(ty)?,
                value: self.opt(*value)?,
            },
            D::Cast { arg, kind, ty, value } => ExprKind::Cast {
                arg: self.expr(*arg)?,
                kind: *kind,
                ty: self.ttype(ty)?,
                value: self.opt(*value)?,
            },
            D::FunctionCall { name, original_name, args, ty, value, dt } => ExprKind::FunctionCall {
                name: self.sym(name)?,
                original_name: original_name.as_ref().map(|o| self.sym(o)).transpose()?,
                args: self.args(args)?,
                ty: self.ttype(ty)?,
                value: self.opt(*value)?,
                dt: self.opt(*dt)?,
            },
            D::ArrayItem { v, args, ty } => ExprKind::ArrayItem {
                v: self.expr(*v)?,
                args: self.indices(args)?,
                ty: self.ttype(ty)?,
            },
            D::ArraySection { v, args, ty } => ExprKind::ArraySection {
                v: self.expr(*v)?,
                args: self.indices(args)?,
                ty: self.ttype(ty)?,
            },
            D::ArrayConstant { args, ty } => {
                ExprKind::ArrayConstant { args: self.all(args)?, ty: self.ttype(ty)? }
            }
            D::ImpliedDoLoop { values, var, start, end, increment, ty } => ExprKind::ImpliedDoLoop {
                values: self.all(values)?,
                var: self.expr(*var)?,
                start: self.expr(*start)?,
                end: self.expr(*end)?,
                increment: self.opt(*increment)?,
                ty: self.ttype(ty)?,
            },
            D::ArrayBound { v, dim, bound, ty, value } => ExprKind::ArrayBound {
                v: self.expr(*v)?,
                dim: self.opt(*dim)?,
                bound: *bound,
                ty: self.ttype(ty)?,
                value: self.opt(*value)?,
            },
            D::ArraySize { v, dim, ty, value } => ExprKind::ArraySize {
                v: self.expr(*v)?,
                dim: self.opt(*dim)?,
                ty: self.ttype(ty)?,
                value: self.opt(*value)?,
            },
            D::Allocated { v, ty } => ExprKind::Allocated { v: self.expr(*v)?, ty: self.ttype(ty)? },
            D::StructInstanceMember { v, member, ty } => ExprKind::StructInstanceMember {
                v: self.expr(*v)?,
                member: self.sym(member)?,
                ty: self.ttype(ty)?,
            },
            D::StructConstructor { dt_sym, args, ty } => ExprKind::StructConstructor {
                dt_sym: self.sym(dt_sym)?,
                args: self.args(args)?,
                ty: self.ttype(ty)?,
            },
            D::ListConstant { args, ty } => {
                ExprKind::ListConstant { args: self.all(args)?, ty: self.ttype(ty)? }
            }
            D::ListLen { arg, ty } => ExprKind::ListLen { arg: self.expr(*arg)?, ty: self.ttype(ty)? },
            D::ListItem { a, pos, ty } => ExprKind::ListItem {
                a: self.expr(*a)?,
                pos: self.expr(*pos)?,
                ty: self.ttype(ty)?,
            },
            D::TupleConstant { elements, ty } => {
                ExprKind::TupleConstant { elements: self.all(elements)?, ty: self.ttype(ty)? }
            }
            D::TupleItem { a, pos, ty } => ExprKind::TupleItem {
                a: self.expr(*a)?,
                pos: self.expr(*pos)?,
                ty: self.ttype(ty)?,
            },
        })
    }

    fn stmt_kind(&self, dto: &StmtKindDto) -> ModfileResult<StmtKind> {
        use StmtKindDto as D;
        Ok(match dto {
            D::Assignment { target, value } => {
                StmtKind::Assignment { target: self.expr(*target)?, value: self.expr(*value)? }
            }
            D::DoLoop { v, start, end, increment, body } => StmtKind::DoLoop {
                head: DoLoopHead {
                    v: self.expr(*v)?,
                    start: self.expr(*start)?,
                    end: self.expr(*end)?,
                    increment: self.opt(*increment)?,
                },
                body: self.body(body)?,
            },
            D::If { test, body, orelse } => StmtKind::If {
                test: self.expr(*test)?,
                body: self.body(body)?,
                orelse: self.body(orelse)?,
            },
            D::Where { test, body, orelse } => StmtKind::Where {
                test: self.expr(*test)?,
                body: self.body(body)?,
                orelse: self.body(orelse)?,
            },
            D::Print { values, separator, end } => StmtKind::Print {
                values: self.all(values)?,
                separator: self.opt(*separator)?,
                end: self.opt(*end)?,
            },
            D::SubroutineCall { name, original_name, args, dt } => StmtKind::SubroutineCall {
                name: self.sym(name)?,
                original_name: original_name.as_ref().map(|o| self.sym(o)).transpose()?,
                args: self.args(args)?,
                dt: self.opt(*dt)?,
            },
            D::Return => StmtKind::Return,
            D::Exit => StmtKind::Exit,
            D::Cycle => StmtKind::Cycle,
            D::GoTo { target_id, name } => {
                StmtKind::GoTo { target_id: *target_id, name: name.clone() }
            }
            D::BlockCall { label, m } => StmtKind::BlockCall { label: *label, m: self.sym(m)? },
            D::Allocate { args } => StmtKind::Allocate {
                args: args
                    .iter()
                    .map(|alloc| Ok(Allocation { a: self.expr(alloc.a)?, dims: self.dims(&alloc.dims)? }))
                    .collect::<ModfileResult<_>>()?,
            },
            D::ExplicitDeallocate { vars } => StmtKind::ExplicitDeallocate { vars: self.all(vars)? },
        })
    }
}
