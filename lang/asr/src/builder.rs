//! Constructors for ASR nodes.
//!
//! Front ends and tests use these to assemble well-formed trees without wiring table
//! back links by hand. Every constructor yields nodes located at [`Location::initial`];
//! callers with source information overwrite `loc` afterwards.

use crate::{
    Abi, Access, ArrayIndex, AsrResult, BinOp, Block, CmpOp, DefType, Dimension, DoLoopHead,
    ExprId, ExprKind, ExternalSymbol, Function, GenericProcedure, Intent, Location, Module,
    Program, StmtId, StmtKind, Storage, StructType, SymbolId, SymtabId, Ttype, Variable,
};
use crate::{Asr, AsrError};

/// A local variable of type `ty` registered in `scope`, not yet allocated.
pub fn variable(scope: SymtabId, name: &str, ty: Ttype) -> Variable {
    Variable {
        loc: Location::initial(),
        parent_symtab: scope,
        name: name.to_owned(),
        intent: Intent::Local,
        symbolic_value: None,
        value: None,
        storage: Storage::Default,
        ty,
        abi: Abi::Source,
        access: Access::Public,
    }
}

pub fn add_variable(asr: &mut Asr, scope: SymtabId, name: &str, ty: Ttype) -> AsrResult<SymbolId> {
    asr.add_symbol(scope, variable(scope, name, ty).into())
}

/// A named constant with the given value.
pub fn add_parameter(
    asr: &mut Asr,
    scope: SymtabId,
    name: &str,
    value: ExprId,
) -> AsrResult<SymbolId> {
    let ty = asr.expr_type(value).cloned().unwrap_or_else(Ttype::int);
    let var = Variable {
        storage: Storage::Parameter,
        symbolic_value: Some(value),
        value: Some(value),
        ..variable(scope, name, ty)
    };
    asr.add_symbol(scope, var.into())
}

pub fn add_program(asr: &mut Asr, name: &str) -> AsrResult<SymbolId> {
    let global = asr.global_scope();
    let symtab = asr.new_symtab(Some(global));
    asr.add_symbol(
        global,
        Program {
            loc: Location::initial(),
            symtab,
            name: name.to_owned(),
            dependencies: vec![],
            body: vec![],
        }
        .into(),
    )
}

pub fn add_module(asr: &mut Asr, name: &str, dependencies: &[&str]) -> AsrResult<SymbolId> {
    let global = asr.global_scope();
    let symtab = asr.new_symtab(Some(global));
    asr.add_symbol(
        global,
        Module {
            loc: Location::initial(),
            symtab,
            name: name.to_owned(),
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
            loaded_from_mod: false,
            intrinsic: false,
        }
        .into(),
    )
}

pub fn add_block(asr: &mut Asr, scope: SymtabId, name: &str) -> AsrResult<SymbolId> {
    let symtab = asr.new_symtab(Some(scope));
    asr.add_symbol(
        scope,
        Block { loc: Location::initial(), symtab, name: name.to_owned(), body: vec![] }.into(),
    )
}

pub fn add_generic(
    asr: &mut Asr,
    scope: SymtabId,
    name: &str,
    procs: Vec<SymbolId>,
) -> AsrResult<SymbolId> {
    asr.add_symbol(
        scope,
        GenericProcedure {
            loc: Location::initial(),
            parent_symtab: scope,
            name: name.to_owned(),
            procs,
            access: Access::Public,
        }
        .into(),
    )
}

/// A derived type whose members are plain variables of the given types.
pub fn add_struct_type(
    asr: &mut Asr,
    scope: SymtabId,
    name: &str,
    members: &[(&str, Ttype)],
    parent: Option<SymbolId>,
) -> AsrResult<SymbolId> {
    let symtab = asr.new_symtab(Some(scope));
    for (member, ty) in members {
        add_variable(asr, symtab, member, ty.clone())?;
    }
    asr.add_symbol(
        scope,
        StructType {
            loc: Location::initial(),
            symtab,
            name: name.to_owned(),
            dependencies: vec![],
            members: members.iter().map(|(m, _)| m.to_string()).collect(),
            abi: Abi::Source,
            access: Access::Public,
            parent,
        }
        .into(),
    )
}

/// An external symbol `name` in `scope` standing for `target`, already linked.
///
/// `scope_names` are computed from the position of `target` below its module.
pub fn add_external(
    asr: &mut Asr,
    scope: SymtabId,
    name: &str,
    target: SymbolId,
) -> AsrResult<SymbolId> {
    let module = asr.module_of(target).ok_or_else(|| AsrError::WrongSymbolKind {
        name: asr.symbol(target).name().to_owned(),
        expected: "module member",
        actual: asr.symbol(target).kind().as_str(),
        span: None,
    })?;
    let mut scope_names = Vec::new();
    let mut current = asr.parent_symtab(target).and_then(|t| asr.owner_symbol(t));
    while let Some(owner) = current {
        if owner == module {
            break;
        }
        scope_names.push(asr.symbol(owner).name().to_owned());
        current = asr.parent_symtab(owner).and_then(|t| asr.owner_symbol(t));
    }
    scope_names.reverse();
    let ext = ExternalSymbol {
        loc: Location::initial(),
        parent_symtab: scope,
        name: name.to_owned(),
        external: Some(target),
        module_name: asr.symbol(module).name().to_owned(),
        scope_names,
        original_name: asr.symbol(target).name().to_owned(),
        access: Access::Public,
    };
    asr.add_symbol(scope, ext.into())
}

/// Append a statement to the body of a program, function or block.
pub fn push_stmt(asr: &mut Asr, owner: SymbolId, stmt: StmtId) {
    if let Some(body) = asr.symbol_mut(owner).body_mut() {
        body.push(stmt);
    }
}

/// Builds a [`Function`] together with its dummy arguments and result variable.
pub struct FunctionBuilder<'a> {
    asr: &'a mut Asr,
    parent: SymtabId,
    symtab: SymtabId,
    function: Function,
    error: Option<AsrError>,
}

impl<'a> FunctionBuilder<'a> {
    pub fn new(asr: &'a mut Asr, parent: SymtabId, name: &str) -> FunctionBuilder<'a> {
        let symtab = asr.new_symtab(Some(parent));
        let function = Function {
            loc: Location::initial(),
            symtab,
            name: name.to_owned(),
            args: vec![],
            body: vec![],
            return_var: None,
            dependencies: vec![],
            type_params: vec![],
            abi: Abi::Source,
            access: Access::Public,
            deftype: DefType::Implementation,
            inline: false,
        };
        FunctionBuilder { asr, parent, symtab, function, error: None }
    }

    /// The table of the function under construction, for adding locals.
    pub fn scope(&self) -> SymtabId {
        self.symtab
    }

    pub fn asr(&mut self) -> &mut Asr {
        &mut *self.asr
    }

    pub fn arg(mut self, name: &str, ty: Ttype, intent: Intent) -> Self {
        let var = Variable { intent, ..variable(self.symtab, name, ty) };
        match self.asr.add_symbol(self.symtab, var.into()) {
            Ok(sym) => {
                let arg = self.asr.var(sym);
                self.function.args.push(arg);
            }
            Err(err) => {
                self.error.get_or_insert(err);
            }
        }
        self
    }

    /// Declare the result variable; its name is the function's name.
    pub fn returns(mut self, ty: Ttype) -> Self {
        let name = self.function.name.clone();
        let var = Variable { intent: Intent::ReturnVar, ..variable(self.symtab, &name, ty) };
        match self.asr.add_symbol(self.symtab, var.into()) {
            Ok(sym) => self.function.return_var = Some(self.asr.var(sym)),
            Err(err) => {
                self.error.get_or_insert(err);
            }
        }
        self
    }

    pub fn local(mut self, name: &str, ty: Ttype) -> Self {
        if let Err(err) = add_variable(self.asr, self.symtab, name, ty) {
            self.error.get_or_insert(err);
        }
        self
    }

    pub fn type_param(mut self, name: &str) -> Self {
        self.function.type_params.push(name.to_owned());
        self
    }

    pub fn inline(mut self) -> Self {
        self.function.inline = true;
        self
    }

    pub fn abi(mut self, abi: Abi) -> Self {
        self.function.abi = abi;
        self
    }

    pub fn access(mut self, access: Access) -> Self {
        self.function.access = access;
        self
    }

    pub fn interface(mut self) -> Self {
        self.function.deftype = DefType::Interface;
        self
    }

    pub fn finish(self) -> AsrResult<SymbolId> {
        if let Some(err) = self.error {
            return Err(err);
        }
        self.asr.add_symbol(self.parent, self.function.into())
    }
}

// Expressions and statements
//
//

impl Asr {
    pub fn int(&mut self, n: i64) -> ExprId {
        self.add_expr(Location::initial(), ExprKind::IntegerConstant { n, ty: Ttype::int() })
    }

    pub fn real(&mut self, r: f64) -> ExprId {
        self.add_expr(Location::initial(), ExprKind::RealConstant { r, ty: Ttype::real() })
    }

    pub fn logical(&mut self, value: bool) -> ExprId {
        self.add_expr(Location::initial(), ExprKind::LogicalConstant { value, ty: Ttype::logical() })
    }

    pub fn string(&mut self, s: &str) -> ExprId {
        let ty = Ttype::character(s.len() as i64);
        self.add_expr(Location::initial(), ExprKind::StringConstant { s: s.to_owned(), ty })
    }

    pub fn var(&mut self, sym: SymbolId) -> ExprId {
        self.add_expr(Location::initial(), ExprKind::Var { sym })
    }

    /// Arithmetic; the result has the type of the left operand.
    pub fn binop(&mut self, left: ExprId, op: BinOp, right: ExprId) -> ExprId {
        let ty = self.expr_type(left).cloned().unwrap_or_else(Ttype::int);
        let loc = self.expr(left).loc.merge(self.expr(right).loc);
        self.add_expr(loc, ExprKind::BinOp { left, op, right, ty, value: None })
    }

    pub fn compare(&mut self, left: ExprId, op: CmpOp, right: ExprId) -> ExprId {
        let loc = self.expr(left).loc.merge(self.expr(right).loc);
        self.add_expr(loc, ExprKind::Compare { left, op, right, ty: Ttype::logical(), value: None })
    }

    /// `v(i1, ..., in)`
    pub fn item(&mut self, v: ExprId, indices: &[ExprId]) -> ExprId {
        let ty = self.expr_type(v).map(|t| t.past_array().clone()).unwrap_or_else(Ttype::int);
        let args = indices.iter().copied().map(ArrayIndex::item).collect();
        self.add_expr(self.expr(v).loc, ExprKind::ArrayItem { v, args, ty })
    }

    /// `v(l1:r1:s1, ...)`; the section's extent is computed when the bounds are constant.
    pub fn section(&mut self, v: ExprId, indices: Vec<ArrayIndex>) -> ExprId {
        let array_ty = self.expr_type(v).cloned().unwrap_or_else(Ttype::int);
        let declared = array_ty.dims().to_vec();
        let mut dims = Vec::new();
        for (axis, idx) in indices.iter().enumerate() {
            if !idx.is_slice() {
                continue;
            }
            let decl = declared.get(axis).copied().unwrap_or_default();
            let lower = match idx.left.or(decl.start) {
                Some(l) => self.const_int(l),
                None => Some(1),
            };
            let upper = match idx.right {
                Some(r) => self.const_int(r),
                None => match (decl.start.and_then(|s| self.const_int(s)), decl.length) {
                    (Some(start), Some(len)) => self.const_int(len).map(|len| start + len - 1),
                    (None, Some(len)) => self.const_int(len),
                    _ => None,
                },
            };
            let step = match idx.step {
                Some(s) => self.const_int(s),
                None => Some(1),
            };
            let length = match (lower, upper, step) {
                (Some(l), Some(u), Some(s)) if s != 0 => Some(self.int(((u - l) / s + 1).max(0))),
                _ => None,
            };
            let start = self.int(1);
            dims.push(Dimension { start: Some(start), length });
        }
        let ty = Ttype::array(array_ty.past_array().clone(), dims);
        self.add_expr(self.expr(v).loc, ExprKind::ArraySection { v, args: indices, ty })
    }

    pub fn call(&mut self, func: SymbolId, args: Vec<ExprId>) -> ExprId {
        let ty = self.symbol_type(func).cloned().unwrap_or_else(Ttype::int);
        let args = args.into_iter().map(Some).collect();
        self.add_expr(
            Location::initial(),
            ExprKind::FunctionCall { name: func, original_name: None, args, ty, value: None, dt: None },
        )
    }

    pub fn assign(&mut self, target: ExprId, value: ExprId) -> StmtId {
        let loc = self.expr(target).loc.merge(self.expr(value).loc);
        self.add_stmt(loc, StmtKind::Assignment { target, value })
    }

    pub fn do_loop(
        &mut self,
        v: ExprId,
        start: ExprId,
        end: ExprId,
        increment: Option<ExprId>,
        body: Vec<StmtId>,
    ) -> StmtId {
        let head = DoLoopHead { v, start, end, increment };
        self.add_stmt(Location::initial(), StmtKind::DoLoop { head, body })
    }

    pub fn if_stmt(&mut self, test: ExprId, body: Vec<StmtId>, orelse: Vec<StmtId>) -> StmtId {
        self.add_stmt(Location::initial(), StmtKind::If { test, body, orelse })
    }

    pub fn print(&mut self, values: Vec<ExprId>) -> StmtId {
        self.add_stmt(Location::initial(), StmtKind::Print { values, separator: None, end: None })
    }

    pub fn subroutine_call(&mut self, name: SymbolId, args: Vec<ExprId>) -> StmtId {
        let args = args.into_iter().map(Some).collect();
        self.add_stmt(
            Location::initial(),
            StmtKind::SubroutineCall { name, original_name: None, args, dt: None },
        )
    }

    pub fn return_stmt(&mut self) -> StmtId {
        self.add_stmt(Location::initial(), StmtKind::Return)
    }
}

/// A 1-based array axis of constant extent.
pub fn dim(asr: &mut Asr, length: i64) -> Dimension {
    let start = asr.int(1);
    let length = asr.int(length);
    Dimension { start: Some(start), length: Some(length) }
}

/// A 1-based array type of constant shape.
pub fn array_of(asr: &mut Asr, elem: Ttype, shape: &[i64]) -> Ttype {
    let dims = shape.iter().map(|len| dim(asr, *len)).collect();
    Ttype::array(elem, dims)
}
