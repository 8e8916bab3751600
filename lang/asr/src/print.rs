use lasr_lang_printer::theme::ThemeExt;
use lasr_lang_printer::tokens::*;
use lasr_lang_printer::util::{list, node};
use lasr_lang_printer::{Alloc, Builder, DocAllocator, Print, PrintCfg, PrintInCtx};

use crate::{
    Abi, Access, Asr, Dimension, ExprId, ExprKind, Intent, Item, StmtId, StmtKind, Storage, Symbol,
    SymbolId, SymtabId, Ttype,
};

/// Prints the tree as nested s-expressions, naming symbols by the counter of the table
/// they live in and their name, e.g. `(Var 2 x)`.
struct Printer<'a, 'c> {
    asr: &'a Asr,
    cfg: &'c PrintCfg,
    alloc: &'a Alloc<'a>,
}

impl<'a> Print<'a> for Asr {
    fn print(&'a self, cfg: &PrintCfg, alloc: &'a Alloc<'a>) -> Builder<'a> {
        let p = Printer { asr: self, cfg, alloc };
        let items = self.unit.items.iter().map(|item| match item {
            Item::Stmt(s) => p.stmt(*s),
            Item::Expr(e) => p.expr(*e),
        });
        let items = list(cfg, alloc, items);
        p.node(TRANSLATION_UNIT, [p.symtab(self.global_scope()), items])
    }
}

impl<'a> PrintInCtx<'a> for ExprId {
    type Ctx = Asr;

    fn print_in_ctx(&'a self, cfg: &PrintCfg, ctx: &'a Asr, alloc: &'a Alloc<'a>) -> Builder<'a> {
        Printer { asr: ctx, cfg, alloc }.expr(*self)
    }
}

impl<'a> PrintInCtx<'a> for StmtId {
    type Ctx = Asr;

    fn print_in_ctx(&'a self, cfg: &PrintCfg, ctx: &'a Asr, alloc: &'a Alloc<'a>) -> Builder<'a> {
        Printer { asr: ctx, cfg, alloc }.stmt(*self)
    }
}

impl<'a> PrintInCtx<'a> for SymbolId {
    type Ctx = Asr;

    fn print_in_ctx(&'a self, cfg: &PrintCfg, ctx: &'a Asr, alloc: &'a Alloc<'a>) -> Builder<'a> {
        Printer { asr: ctx, cfg, alloc }.symbol(*self)
    }
}

impl<'a> Printer<'a, '_> {
    fn node<const N: usize>(&self, head: &'a str, children: [Builder<'a>; N]) -> Builder<'a> {
        node(self.cfg, self.alloc, self.alloc.keyword(head), children)
    }

    fn text(&self, s: &str) -> Builder<'a> {
        self.alloc.text(s.to_owned())
    }

    fn none(&self) -> Builder<'a> {
        self.alloc.text(NONE)
    }

    fn flag(&self, b: bool) -> Builder<'a> {
        self.alloc.literal(if b { ".true." } else { ".false." }.to_owned())
    }

    fn names(&self, names: &[String]) -> Builder<'a> {
        list(self.cfg, self.alloc, names.iter().map(|n| self.text(n)))
    }

    fn opt_expr(&self, expr: Option<ExprId>) -> Builder<'a> {
        match expr {
            Some(e) => self.expr(e),
            None => self.none(),
        }
    }

    fn exprs(&self, exprs: &[ExprId]) -> Builder<'a> {
        list(self.cfg, self.alloc, exprs.iter().map(|e| self.expr(*e)))
    }

    fn opt_exprs(&self, exprs: &[Option<ExprId>]) -> Builder<'a> {
        list(self.cfg, self.alloc, exprs.iter().map(|e| self.opt_expr(*e)))
    }

    fn body(&self, body: &[StmtId]) -> Builder<'a> {
        list(self.cfg, self.alloc, body.iter().map(|s| self.stmt(*s)))
    }

    fn counter(&self, symtab: SymtabId) -> Builder<'a> {
        let counter = if self.cfg.show_counters {
            self.asr.symtab(symtab).counter.to_string()
        } else {
            "_".to_owned()
        };
        self.alloc.literal(counter)
    }

    /// A reference to a symbol: the counter of its table and its name.
    fn sym_ref(&self, sym: SymbolId) -> Builder<'a> {
        let name = self.alloc.symbol(self.asr.symbol(sym).name().to_owned());
        match self.asr.parent_symtab(sym) {
            Some(parent) => self.counter(parent).append(self.alloc.space()).append(name),
            None => name,
        }
    }

    fn opt_sym_ref(&self, sym: Option<SymbolId>) -> Builder<'a> {
        match sym {
            Some(s) => self.sym_ref(s),
            None => self.none(),
        }
    }

    fn symtab(&self, symtab: SymtabId) -> Builder<'a> {
        let alloc = self.alloc;
        let entries: Vec<_> = self
            .asr
            .symtab(symtab)
            .scope()
            .map(|(name, sym)| {
                let value = if self.asr.parent_symtab(sym) == Some(symtab) {
                    self.symbol(sym)
                } else {
                    self.sym_ref(sym)
                };
                self.alloc
                    .symbol(name.to_owned())
                    .append(COLON)
                    .append(alloc.line().append(value).nest(self.cfg.indent).group())
            })
            .collect();
        let scope = if entries.is_empty() {
            alloc.nil().braces()
        } else {
            alloc
                .line_()
                .append(alloc.intersperse(entries, alloc.text(COMMA).append(alloc.hardline())))
                .nest(self.cfg.indent)
                .append(alloc.line_())
                .group()
                .braces()
        };
        self.node(SYMBOL_TABLE, [self.counter(symtab), scope])
    }

    fn symbol(&self, sym: SymbolId) -> Builder<'a> {
        match self.asr.symbol(sym) {
            Symbol::Program(x) => self.node(
                PROGRAM,
                [self.symtab(x.symtab), self.text(&x.name), self.names(&x.dependencies), self.body(&x.body)],
            ),
            Symbol::Module(x) => self.node(
                MODULE,
                [
                    self.symtab(x.symtab),
                    self.text(&x.name),
                    self.names(&x.dependencies),
                    self.flag(x.loaded_from_mod),
                    self.flag(x.intrinsic),
                ],
            ),
            Symbol::Function(x) => self.node(
                FUNCTION,
                [
                    self.symtab(x.symtab),
                    self.text(&x.name),
                    self.names(&x.type_params),
                    self.exprs(&x.args),
                    self.body(&x.body),
                    self.opt_expr(x.return_var),
                    self.names(&x.dependencies),
                    self.abi(x.abi),
                    self.access(x.access),
                    self.text(&format!("{:?}", x.deftype)),
                    self.flag(x.inline),
                ],
            ),
            Symbol::GenericProcedure(x) => self.node(
                GENERIC_PROCEDURE,
                [
                    self.counter(x.parent_symtab),
                    self.text(&x.name),
                    list(self.cfg, self.alloc, x.procs.iter().map(|p| self.sym_ref(*p))),
                    self.access(x.access),
                ],
            ),
            Symbol::Variable(x) => self.node(
                VARIABLE,
                [
                    self.counter(x.parent_symtab),
                    self.text(&x.name),
                    self.intent(x.intent),
                    self.opt_expr(x.symbolic_value),
                    self.opt_expr(x.value),
                    self.storage(x.storage),
                    self.ttype(&x.ty),
                    self.abi(x.abi),
                    self.access(x.access),
                ],
            ),
            Symbol::StructType(x) => self.node(
                STRUCT_TYPE,
                [
                    self.symtab(x.symtab),
                    self.text(&x.name),
                    self.names(&x.dependencies),
                    self.names(&x.members),
                    self.abi(x.abi),
                    self.access(x.access),
                    self.opt_sym_ref(x.parent),
                ],
            ),
            Symbol::ExternalSymbol(x) => self.node(
                EXTERNAL_SYMBOL,
                [
                    self.counter(x.parent_symtab),
                    self.text(&x.name),
                    self.opt_sym_ref(x.external),
                    self.text(&x.module_name),
                    self.names(&x.scope_names),
                    self.text(&x.original_name),
                    self.access(x.access),
                ],
            ),
            Symbol::ClassProcedure(x) => self.node(
                CLASS_PROCEDURE,
                [
                    self.counter(x.parent_symtab),
                    self.text(&x.name),
                    x.self_argument.as_deref().map(|s| self.text(s)).unwrap_or_else(|| self.none()),
                    self.text(&x.proc_name),
                    self.sym_ref(x.proc),
                    self.abi(x.abi),
                ],
            ),
            Symbol::Block(x) => {
                self.node(BLOCK, [self.symtab(x.symtab), self.text(&x.name), self.body(&x.body)])
            }
        }
    }

    fn intent(&self, intent: Intent) -> Builder<'a> {
        self.text(&format!("{intent:?}"))
    }

    fn storage(&self, storage: Storage) -> Builder<'a> {
        self.text(&format!("{storage:?}"))
    }

    fn abi(&self, abi: Abi) -> Builder<'a> {
        self.text(&format!("{abi:?}"))
    }

    fn access(&self, access: Access) -> Builder<'a> {
        self.text(&format!("{access:?}"))
    }

    fn dims(&self, dims: &[Dimension]) -> Builder<'a> {
        list(
            self.cfg,
            self.alloc,
            dims.iter().map(|d| {
                self.opt_expr(d.start)
                    .append(self.alloc.space())
                    .append(self.opt_expr(d.length))
                    .parens()
            }),
        )
    }

    fn type_node<const N: usize>(&self, head: &'a str, children: [Builder<'a>; N]) -> Builder<'a> {
        node(self.cfg, self.alloc, self.alloc.typ(head), children)
    }

    fn kind(&self, head: &'a str, kind: u8) -> Builder<'a> {
        self.type_node(head, [self.alloc.literal(kind.to_string())])
    }

    fn ttype(&self, ty: &Ttype) -> Builder<'a> {
        match ty {
            Ttype::Integer { kind } => self.kind("Integer", *kind),
            Ttype::Real { kind } => self.kind("Real", *kind),
            Ttype::Complex { kind } => self.kind("Complex", *kind),
            Ttype::Logical { kind } => self.kind("Logical", *kind),
            Ttype::Character { kind, len } => self.type_node(
                "Character",
                [self.alloc.literal(kind.to_string()), self.alloc.literal(len.to_string())],
            ),
            Ttype::Struct { derived_type } => self.type_node("Struct", [self.sym_ref(*derived_type)]),
            Ttype::TypeParameter { param } => self.type_node("TypeParameter", [self.text(param)]),
            Ttype::Array { elem, dims } => self.type_node("Array", [self.ttype(elem), self.dims(dims)]),
            Ttype::Pointer(inner) => self.type_node("Pointer", [self.ttype(inner)]),
            Ttype::Allocatable(inner) => self.type_node("Allocatable", [self.ttype(inner)]),
            Ttype::List(inner) => self.type_node("List", [self.ttype(inner)]),
            Ttype::Tuple(elems) => {
                let elems = elems.iter().map(|t| self.ttype(t));
                node(self.cfg, self.alloc, self.alloc.typ("Tuple"), elems)
            }
        }
    }

    fn value(&self, value: Option<ExprId>) -> Builder<'a> {
        if self.cfg.show_values { self.opt_expr(value) } else { self.none() }
    }

    fn expr(&self, expr: ExprId) -> Builder<'a> {
        use ExprKind::*;
        let alloc = self.alloc;
        match &self.asr.expr(expr).kind {
            IntegerConstant { n, ty } => {
                self.node("IntegerConstant", [alloc.literal(n.to_string()), self.ttype(ty)])
            }
            RealConstant { r, ty } => {
                self.node("RealConstant", [alloc.literal(format!("{r:?}")), self.ttype(ty)])
            }
            LogicalConstant { value, ty } => {
                self.node("LogicalConstant", [self.flag(*value), self.ttype(ty)])
            }
            StringConstant { s, ty } => {
                self.node("StringConstant", [alloc.literal(format!("{s:?}")), self.ttype(ty)])
            }
            Var { sym } => self.node("Var", [self.sym_ref(*sym)]),
            BinOp { left, op, right, ty, value } => self.node(
                "BinOp",
                [self.expr(*left), self.text(&format!("{op:?}")), self.expr(*right), self.ttype(ty), self.value(*value)],
            ),
            Compare { left, op, right, ty, value } => self.node(
                "Compare",
                [self.expr(*left), self.text(&format!("{op:?}")), self.expr(*right), self.ttype(ty), self.value(*value)],
            ),
            LogicalBinOp { left, op, right, ty, value } => self.node(
                "LogicalBinOp",
                [self.expr(*left), self.text(&format!("{op:?}")), self.expr(*right), self.ttype(ty), self.value(*value)],
            ),
            LogicalNot { arg, ty, value } => {
                self.node("LogicalNot", [self.expr(*arg), self.ttype(ty), self.value(*value)])
            }
            Cast { arg, kind, ty, value } => self.node(
                "Cast",
                [self.expr(*arg), self.text(&format!("{kind:?}")), self.ttype(ty), self.value(*value)],
            ),
            FunctionCall { name, original_name, args, ty, value, dt } => self.node(
                "FunctionCall",
                [
                    self.sym_ref(*name),
                    self.opt_sym_ref(*original_name),
                    self.opt_exprs(args),
                    self.ttype(ty),
                    self.value(*value),
                    self.opt_expr(*dt),
                ],
            ),
            ArrayItem { v, args, ty } | ArraySection { v, args, ty } => {
                let head = if matches!(self.asr.expr(expr).kind, ArrayItem { .. }) {
                    "ArrayItem"
                } else {
                    "ArraySection"
                };
                let indices = args.iter().map(|idx| {
                    self.opt_expr(idx.left)
                        .append(alloc.space())
                        .append(self.opt_expr(idx.right))
                        .append(alloc.space())
                        .append(self.opt_expr(idx.step))
                        .parens()
                });
                self.node(head, [self.expr(*v), list(self.cfg, alloc, indices), self.ttype(ty)])
            }
            ArrayConstant { args, ty } => self.node("ArrayConstant", [self.exprs(args), self.ttype(ty)]),
            ImpliedDoLoop { values, var, start, end, increment, ty } => self.node(
                "ImpliedDoLoop",
                [
                    self.exprs(values),
                    self.expr(*var),
                    self.expr(*start),
                    self.expr(*end),
                    self.opt_expr(*increment),
                    self.ttype(ty),
                ],
            ),
            ArrayBound { v, dim, bound, ty, value } => self.node(
                "ArrayBound",
                [self.expr(*v), self.opt_expr(*dim), self.text(&format!("{bound:?}")), self.ttype(ty), self.value(*value)],
            ),
            ArraySize { v, dim, ty, value } => self.node(
                "ArraySize",
                [self.expr(*v), self.opt_expr(*dim), self.ttype(ty), self.value(*value)],
            ),
            Allocated { v, ty } => self.node("Allocated", [self.expr(*v), self.ttype(ty)]),
            StructInstanceMember { v, member, ty } => self.node(
                "StructInstanceMember",
                [self.expr(*v), self.sym_ref(*member), self.ttype(ty)],
            ),
            StructConstructor { dt_sym, args, ty } => self.node(
                "StructConstructor",
                [self.sym_ref(*dt_sym), self.opt_exprs(args), self.ttype(ty)],
            ),
            ListConstant { args, ty } => self.node("ListConstant", [self.exprs(args), self.ttype(ty)]),
            ListLen { arg, ty } => self.node("ListLen", [self.expr(*arg), self.ttype(ty)]),
            ListItem { a, pos, ty } => {
                self.node("ListItem", [self.expr(*a), self.expr(*pos), self.ttype(ty)])
            }
            TupleConstant { elements, ty } => {
                self.node("TupleConstant", [self.exprs(elements), self.ttype(ty)])
            }
            TupleItem { a, pos, ty } => {
                self.node("TupleItem", [self.expr(*a), self.expr(*pos), self.ttype(ty)])
            }
        }
    }

    fn stmt(&self, stmt: StmtId) -> Builder<'a> {
        use StmtKind::*;
        let alloc = self.alloc;
        match &self.asr.stmt(stmt).kind {
            Assignment { target, value } => self.node("=", [self.expr(*target), self.expr(*value)]),
            DoLoop { head, body } => {
                let head = self.expr(head.v)
                    .append(alloc.space())
                    .append(self.expr(head.start))
                    .append(alloc.space())
                    .append(self.expr(head.end))
                    .append(alloc.space())
                    .append(self.opt_expr(head.increment))
                    .parens();
                self.node("DoLoop", [head, self.body(body)])
            }
            If { test, body, orelse } => {
                self.node("If", [self.expr(*test), self.body(body), self.body(orelse)])
            }
            Where { test, body, orelse } => {
                self.node("Where", [self.expr(*test), self.body(body), self.body(orelse)])
            }
            StmtKind::Print { values, separator, end } => self.node(
                "Print",
                [self.exprs(values), self.opt_expr(*separator), self.opt_expr(*end)],
            ),
            SubroutineCall { name, original_name, args, dt } => self.node(
                "SubroutineCall",
                [self.sym_ref(*name), self.opt_sym_ref(*original_name), self.opt_exprs(args), self.opt_expr(*dt)],
            ),
            Return => self.node("Return", []),
            Exit => self.node("Exit", []),
            Cycle => self.node("Cycle", []),
            GoTo { target_id, name } => {
                self.node("GoTo", [alloc.literal(target_id.to_string()), self.text(name)])
            }
            BlockCall { label, m } => {
                self.node("BlockCall", [alloc.literal(label.to_string()), self.sym_ref(*m)])
            }
            Allocate { args } => {
                let args = args.iter().map(|a| {
                    self.expr(a.a).append(alloc.space()).append(self.dims(&a.dims)).parens()
                });
                self.node("Allocate", [list(self.cfg, alloc, args)])
            }
            ExplicitDeallocate { vars } => self.node("ExplicitDeallocate", [self.exprs(vars)]),
        }
    }
}

#[cfg(test)]
mod tests {
    use lasr_lang_printer::{PrintToString, PrintToStringInCtx};

    use crate::builder;

    use super::*;

    #[test]
    fn prints_symbols_with_table_counter() {
        let mut asr = Asr::new();
        let main = builder::add_program(&mut asr, "main").unwrap();
        let scope = asr.symbol(main).symtab().unwrap();
        let x = builder::add_variable(&mut asr, scope, "x", Ttype::int()).unwrap();
        let xv = asr.var(x);
        let one = asr.int(1);
        let stmt = asr.assign(xv, one);
        builder::push_stmt(&mut asr, main, stmt);

        assert_eq!(xv.print_to_string_in_ctx(&asr, None), "(Var 2 x)");
        assert_eq!(
            stmt.print_to_string_in_ctx(&asr, None),
            "(= (Var 2 x) (IntegerConstant 1 (Integer 4)))"
        );
        let unit = asr.print_to_string(None);
        assert!(unit.starts_with("(TranslationUnit"));
        assert!(unit.contains("main:"));
    }
}
