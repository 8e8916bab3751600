//! The on-disk shape of a modfile.
//!
//! Expressions and statements are stored in flat tables and referenced by position.
//! Symbols are referenced by the counter of the table they are registered in together
//! with their name, the only identity that survives a round trip through a file.

use std::collections::BTreeMap;

use serde_derive::{Deserialize, Serialize};

use lasr_lang_asr::{
    Abi, Access, BinOp, BoundKind, CastKind, CmpOp, DefType, Intent, Location, LogicalOp,
    Storage,
};

/// Position of an expression in [`ModfileDto::exprs`].
pub type ExprRef = u32;
/// Position of a statement in [`ModfileDto::stmts`].
pub type StmtRef = u32;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymRef {
    pub symtab: u64,
    pub name: String,
}

/// The leading fields of every modfile, read before anything else.
#[derive(Debug, Deserialize)]
pub struct Header {
    pub format: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModfileDto {
    pub format: String,
    pub version: String,
    pub loc: Location,
    /// Counter of the root table.
    pub global_scope: u64,
    pub symtabs: Vec<SymtabDto>,
    pub exprs: Vec<ExprDto>,
    pub stmts: Vec<StmtDto>,
    #[serde(default)]
    pub items: Vec<ItemDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SymtabDto {
    pub counter: u64,
    pub parent: Option<u64>,
    pub symbols: BTreeMap<String, SymbolDto>,
    /// Entries naming symbols that are registered in another table.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, SymRef>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum ItemDto {
    Stmt(StmtRef),
    Expr(ExprRef),
}

#[derive(Debug, Serialize, Deserialize)]
pub enum SymbolDto {
    Program {
        loc: Location,
        symtab: u64,
        name: String,
        dependencies: Vec<String>,
        body: Vec<StmtRef>,
    },
    Module {
        loc: Location,
        symtab: u64,
        name: String,
        dependencies: Vec<String>,
        loaded_from_mod: bool,
        intrinsic: bool,
    },
    Function {
        loc: Location,
        symtab: u64,
        name: String,
        args: Vec<ExprRef>,
        body: Vec<StmtRef>,
        return_var: Option<ExprRef>,
        dependencies: Vec<String>,
        type_params: Vec<String>,
        abi: Abi,
        access: Access,
        deftype: DefType,
        inline: bool,
    },
    GenericProcedure {
        loc: Location,
        name: String,
        procs: Vec<SymRef>,
        access: Access,
    },
    Variable {
        loc: Location,
        name: String,
        intent: Intent,
        symbolic_value: Option<ExprRef>,
        value: Option<ExprRef>,
        storage: Storage,
        ty: TtypeDto,
        abi: Abi,
        access: Access,
    },
    StructType {
        loc: Location,
        symtab: u64,
        name: String,
        dependencies: Vec<String>,
        members: Vec<String>,
        abi: Abi,
        access: Access,
        parent: Option<SymRef>,
    },
    /// The link to the target is not stored; it is re-resolved after loading.
    ExternalSymbol {
        loc: Location,
        name: String,
        module_name: String,
        scope_names: Vec<String>,
        original_name: String,
        access: Access,
    },
    ClassProcedure {
        loc: Location,
        name: String,
        self_argument: Option<String>,
        proc_name: String,
        proc: SymRef,
        abi: Abi,
    },
    Block {
        loc: Location,
        symtab: u64,
        name: String,
        body: Vec<StmtRef>,
    },
}

impl SymbolDto {
    /// The table owned by the symbol, for scope-owning variants.
    pub fn symtab(&self) -> Option<u64> {
        match self {
            SymbolDto::Program { symtab, .. }
            | SymbolDto::Module { symtab, .. }
            | SymbolDto::Function { symtab, .. }
            | SymbolDto::StructType { symtab, .. }
            | SymbolDto::Block { symtab, .. } => Some(*symtab),
            SymbolDto::GenericProcedure { .. }
            | SymbolDto::Variable { .. }
            | SymbolDto::ExternalSymbol { .. }
            | SymbolDto::ClassProcedure { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TtypeDto {
    Integer { kind: u8 },
    Real { kind: u8 },
    Complex { kind: u8 },
    Logical { kind: u8 },
    Character { kind: u8, len: i64 },
    Struct { derived_type: SymRef },
    TypeParameter { param: String },
    Array { elem: Box<TtypeDto>, dims: Vec<DimensionDto> },
    Pointer(Box<TtypeDto>),
    Allocatable(Box<TtypeDto>),
    List(Box<TtypeDto>),
    Tuple(Vec<TtypeDto>),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DimensionDto {
    pub start: Option<ExprRef>,
    pub length: Option<ExprRef>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ArrayIndexDto {
    pub left: Option<ExprRef>,
    pub right: Option<ExprRef>,
    pub step: Option<ExprRef>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExprDto {
    pub loc: Location,
    pub kind: ExprKindDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub enum ExprKindDto {
    IntegerConstant { n: i64, ty: TtypeDto },
    RealConstant { r: f64, ty: TtypeDto },
    LogicalConstant { value: bool, ty: TtypeDto },
    StringConstant { s: String, ty: TtypeDto },
    Var { sym: SymRef },
    BinOp { left: ExprRef, op: BinOp, right: ExprRef, ty: TtypeDto, value: Option<ExprRef> },
    Compare { left: ExprRef, op: CmpOp, right: ExprRef, ty: TtypeDto, value: Option<ExprRef> },
    LogicalBinOp {
        left: ExprRef,
        op: LogicalOp,
        right: ExprRef,
        ty: TtypeDto,
        value: Option<ExprRef>,
    },
    LogicalNot { arg: ExprRef, ty: TtypeDto, value: Option<ExprRef> },
    Cast { arg: ExprRef, kind: CastKind, ty: TtypeDto, value: Option<ExprRef> },
    FunctionCall {
        name: SymRef,
        original_name: Option<SymRef>,
        args: Vec<Option<ExprRef>>,
        ty: TtypeDto,
        value: Option<ExprRef>,
        dt: Option<ExprRef>,
    },
    ArrayItem { v: ExprRef, args: Vec<ArrayIndexDto>, ty: TtypeDto },
    ArraySection { v: ExprRef, args: Vec<ArrayIndexDto>, ty: TtypeDto },
    ArrayConstant { args: Vec<ExprRef>, ty: TtypeDto },
    ImpliedDoLoop {
        values: Vec<ExprRef>,
        var: ExprRef,
        start: ExprRef,
        end: ExprRef,
        increment: Option<ExprRef>,
        ty: TtypeDto,
    },
    ArrayBound {
        v: ExprRef,
        dim: Option<ExprRef>,
        bound: BoundKind,
        ty: TtypeDto,
        value: Option<ExprRef>,
    },
    ArraySize { v: ExprRef, dim: Option<ExprRef>, ty: TtypeDto, value: Option<ExprRef> },
    Allocated { v: ExprRef, ty: TtypeDto },
    StructInstanceMember { v: ExprRef, member: SymRef, ty: TtypeDto },
    StructConstructor { dt_sym: SymRef, args: Vec<Option<ExprRef>>, ty: TtypeDto },
    ListConstant { args: Vec<ExprRef>, ty: TtypeDto },
    ListLen { arg: ExprRef, ty: TtypeDto },
    ListItem { a: ExprRef, pos: ExprRef, ty: TtypeDto },
    TupleConstant { elements: Vec<ExprRef>, ty: TtypeDto },
    TupleItem { a: ExprRef, pos: ExprRef, ty: TtypeDto },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StmtDto {
    pub loc: Location,
    pub kind: StmtKindDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AllocationDto {
    pub a: ExprRef,
    pub dims: Vec<DimensionDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub enum StmtKindDto {
    Assignment {
        target: ExprRef,
        value: ExprRef,
    },
    DoLoop {
        v: ExprRef,
        start: ExprRef,
        end: ExprRef,
        increment: Option<ExprRef>,
        body: Vec<StmtRef>,
    },
    If {
        test: ExprRef,
        body: Vec<StmtRef>,
        orelse: Vec<StmtRef>,
    },
    Where {
        test: ExprRef,
        body: Vec<StmtRef>,
        orelse: Vec<StmtRef>,
    },
    Print {
        values: Vec<ExprRef>,
        separator: Option<ExprRef>,
        end: Option<ExprRef>,
    },
    SubroutineCall {
        name: SymRef,
        original_name: Option<SymRef>,
        args: Vec<Option<ExprRef>>,
        dt: Option<ExprRef>,
    },
    Return,
    Exit,
    Cycle,
    GoTo {
        target_id: i64,
        name: String,
    },
    BlockCall {
        label: i64,
        m: SymRef,
    },
    Allocate {
        args: Vec<AllocationDto>,
    },
    ExplicitDeallocate {
        vars: Vec<ExprRef>,
    },
}
