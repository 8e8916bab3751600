use derivative::Derivative;
use serde_derive::{Deserialize, Serialize};

use crate::{ExprId, HasLocation, Location, SymbolId, Ttype};

/// An expression node. Equality ignores the source location.
#[derive(Debug, Clone, Derivative)]
#[derivative(PartialEq)]
pub struct Expr {
    #[derivative(PartialEq = "ignore")]
    pub loc: Location,
    pub kind: ExprKind,
}

impl HasLocation for Expr {
    fn loc(&self) -> Location {
        self.loc
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOp {
    And,
    Or,
    Eqv,
    NEqv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CastKind {
    IntegerToReal,
    RealToInteger,
    IntegerToInteger,
    RealToReal,
    LogicalToInteger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundKind {
    LBound,
    UBound,
}

/// One subscript of an array reference.
///
/// For `ArrayItem` only `right` is set. For `ArraySection` a missing `left`/`right`
/// stands for the declared bound and a missing `step` for 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ArrayIndex {
    pub left: Option<ExprId>,
    pub right: Option<ExprId>,
    pub step: Option<ExprId>,
}

impl ArrayIndex {
    pub fn item(idx: ExprId) -> ArrayIndex {
        ArrayIndex { left: None, right: Some(idx), step: None }
    }

    pub fn is_slice(&self) -> bool {
        self.left.is_some() || self.step.is_some() || self.right.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    IntegerConstant {
        n: i64,
        ty: Ttype,
    },
    RealConstant {
        r: f64,
        ty: Ttype,
    },
    LogicalConstant {
        value: bool,
        ty: Ttype,
    },
    StringConstant {
        s: String,
        ty: Ttype,
    },
    /// A reference to a variable (or a procedure passed as an argument).
    Var {
        sym: SymbolId,
    },
    BinOp {
        left: ExprId,
        op: BinOp,
        right: ExprId,
        ty: Ttype,
        value: Option<ExprId>,
    },
    Compare {
        left: ExprId,
        op: CmpOp,
        right: ExprId,
        ty: Ttype,
        value: Option<ExprId>,
    },
    LogicalBinOp {
        left: ExprId,
        op: LogicalOp,
        right: ExprId,
        ty: Ttype,
        value: Option<ExprId>,
    },
    LogicalNot {
        arg: ExprId,
        ty: Ttype,
        value: Option<ExprId>,
    },
    Cast {
        arg: ExprId,
        kind: CastKind,
        ty: Ttype,
        value: Option<ExprId>,
    },
    FunctionCall {
        name: SymbolId,
        /// The generic procedure the call was resolved from, if any.
        original_name: Option<SymbolId>,
        args: Vec<Option<ExprId>>,
        ty: Ttype,
        value: Option<ExprId>,
        /// The object of a type-bound call.
        dt: Option<ExprId>,
    },
    ArrayItem {
        v: ExprId,
        args: Vec<ArrayIndex>,
        ty: Ttype,
    },
    ArraySection {
        v: ExprId,
        args: Vec<ArrayIndex>,
        ty: Ttype,
    },
    ArrayConstant {
        args: Vec<ExprId>,
        ty: Ttype,
    },
    /// `(values..., var = start, end, increment)` inside an array constructor.
    ImpliedDoLoop {
        values: Vec<ExprId>,
        var: ExprId,
        start: ExprId,
        end: ExprId,
        increment: Option<ExprId>,
        ty: Ttype,
    },
    ArrayBound {
        v: ExprId,
        dim: Option<ExprId>,
        bound: BoundKind,
        ty: Ttype,
        value: Option<ExprId>,
    },
    ArraySize {
        v: ExprId,
        dim: Option<ExprId>,
        ty: Ttype,
        value: Option<ExprId>,
    },
    /// `allocated(v)`
    Allocated {
        v: ExprId,
        ty: Ttype,
    },
    StructInstanceMember {
        v: ExprId,
        member: SymbolId,
        ty: Ttype,
    },
    StructConstructor {
        dt_sym: SymbolId,
        args: Vec<Option<ExprId>>,
        ty: Ttype,
    },
    ListConstant {
        args: Vec<ExprId>,
        ty: Ttype,
    },
    ListLen {
        arg: ExprId,
        ty: Ttype,
    },
    ListItem {
        a: ExprId,
        pos: ExprId,
        ty: Ttype,
    },
    TupleConstant {
        elements: Vec<ExprId>,
        ty: Ttype,
    },
    TupleItem {
        a: ExprId,
        pos: ExprId,
        ty: Ttype,
    },
}

impl ExprKind {
    /// The type stored in the node, `None` for `Var` whose type lives on its symbol.
    pub fn ty(&self) -> Option<&Ttype> {
        use ExprKind::*;
        match self {
            Var { .. } => None,
            IntegerConstant { ty, .. }
            | RealConstant { ty, .. }
            | LogicalConstant { ty, .. }
            | StringConstant { ty, .. }
            | BinOp { ty, .. }
            | Compare { ty, .. }
            | LogicalBinOp { ty, .. }
            | LogicalNot { ty, .. }
            | Cast { ty, .. }
            | FunctionCall { ty, .. }
            | ArrayItem { ty, .. }
            | ArraySection { ty, .. }
            | ArrayConstant { ty, .. }
            | ImpliedDoLoop { ty, .. }
            | ArrayBound { ty, .. }
            | ArraySize { ty, .. }
            | Allocated { ty, .. }
            | StructInstanceMember { ty, .. }
            | StructConstructor { ty, .. }
            | ListConstant { ty, .. }
            | ListLen { ty, .. }
            | ListItem { ty, .. }
            | TupleConstant { ty, .. }
            | TupleItem { ty, .. } => Some(ty),
        }
    }

    pub fn ty_mut(&mut self) -> Option<&mut Ttype> {
        use ExprKind::*;
        match self {
            Var { .. } => None,
            IntegerConstant { ty, .. }
            | RealConstant { ty, .. }
            | LogicalConstant { ty, .. }
            | StringConstant { ty, .. }
            | BinOp { ty, .. }
            | Compare { ty, .. }
            | LogicalBinOp { ty, .. }
            | LogicalNot { ty, .. }
            | Cast { ty, .. }
            | FunctionCall { ty, .. }
            | ArrayItem { ty, .. }
            | ArraySection { ty, .. }
            | ArrayConstant { ty, .. }
            | ImpliedDoLoop { ty, .. }
            | ArrayBound { ty, .. }
            | ArraySize { ty, .. }
            | Allocated { ty, .. }
            | StructInstanceMember { ty, .. }
            | StructConstructor { ty, .. }
            | ListConstant { ty, .. }
            | ListLen { ty, .. }
            | ListItem { ty, .. }
            | TupleConstant { ty, .. }
            | TupleItem { ty, .. } => Some(ty),
        }
    }

    /// The compile-time value attached to the node, if it was folded.
    pub fn value(&self) -> Option<ExprId> {
        use ExprKind::*;
        match self {
            BinOp { value, .. }
            | Compare { value, .. }
            | LogicalBinOp { value, .. }
            | LogicalNot { value, .. }
            | Cast { value, .. }
            | FunctionCall { value, .. }
            | ArrayBound { value, .. }
            | ArraySize { value, .. } => *value,
            _ => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(
            self,
            ExprKind::IntegerConstant { .. }
                | ExprKind::RealConstant { .. }
                | ExprKind::LogicalConstant { .. }
                | ExprKind::StringConstant { .. }
        )
    }

    /// Mutable references to every direct child expression slot, in evaluation order.
    ///
    /// Compile-time values and the dimension expressions of the node's type are not
    /// included.
    pub fn children_mut(&mut self) -> Vec<&mut ExprId> {
        use ExprKind::*;
        fn index_slots(args: &mut [crate::ArrayIndex]) -> impl Iterator<Item = &mut ExprId> {
            args.iter_mut().flat_map(|idx| {
                idx.left.iter_mut().chain(idx.right.iter_mut()).chain(idx.step.iter_mut())
            })
        }
        match self {
            IntegerConstant { .. }
            | RealConstant { .. }
            | LogicalConstant { .. }
            | StringConstant { .. }
            | Var { .. } => vec![],
            BinOp { left, right, .. }
            | Compare { left, right, .. }
            | LogicalBinOp { left, right, .. } => vec![left, right],
            LogicalNot { arg, .. } | Cast { arg, .. } | ListLen { arg, .. } => vec![arg],
            FunctionCall { args, dt, .. } => {
                dt.iter_mut().chain(args.iter_mut().flatten()).collect()
            }
            ArrayItem { v, args, .. } | ArraySection { v, args, .. } => {
                std::iter::once(v).chain(index_slots(args)).collect()
            }
            ArrayConstant { args, .. } | ListConstant { args, .. } => args.iter_mut().collect(),
            TupleConstant { elements, .. } => elements.iter_mut().collect(),
            ImpliedDoLoop { values, var, start, end, increment, .. } => values
                .iter_mut()
                .chain([var, start, end])
                .chain(increment.iter_mut())
                .collect(),
            ArrayBound { v, dim, .. } | ArraySize { v, dim, .. } => {
                std::iter::once(v).chain(dim.iter_mut()).collect()
            }
            Allocated { v, .. } | StructInstanceMember { v, .. } => vec![v],
            StructConstructor { args, .. } => args.iter_mut().flatten().collect(),
            ListItem { a, pos, .. } | TupleItem { a, pos, .. } => vec![a, pos],
        }
    }

    /// Every direct child expression, in evaluation order.
    pub fn children(&self) -> Vec<ExprId> {
        self.clone().children_mut().into_iter().map(|id| *id).collect()
    }
}
