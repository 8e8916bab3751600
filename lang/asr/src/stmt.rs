use derivative::Derivative;

use crate::{Dimension, ExprId, HasLocation, Location, StmtId, SymbolId};

/// A statement node. Equality ignores the source location.
#[derive(Debug, Clone, Derivative)]
#[derivative(PartialEq)]
pub struct Stmt {
    #[derivative(PartialEq = "ignore")]
    pub loc: Location,
    pub kind: StmtKind,
}

impl HasLocation for Stmt {
    fn loc(&self) -> Location {
        self.loc
    }
}

/// The header of a counted do loop: `do v = start, end, increment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoLoopHead {
    pub v: ExprId,
    pub start: ExprId,
    pub end: ExprId,
    pub increment: Option<ExprId>,
}

/// One object of an `allocate` statement together with the requested shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub a: ExprId,
    pub dims: Vec<Dimension>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Assignment {
        target: ExprId,
        value: ExprId,
    },
    DoLoop {
        head: DoLoopHead,
        body: Vec<StmtId>,
    },
    If {
        test: ExprId,
        body: Vec<StmtId>,
        orelse: Vec<StmtId>,
    },
    /// `where (test) body elsewhere orelse`, element-wise over arrays.
    Where {
        test: ExprId,
        body: Vec<StmtId>,
        orelse: Vec<StmtId>,
    },
    Print {
        values: Vec<ExprId>,
        separator: Option<ExprId>,
        end: Option<ExprId>,
    },
    SubroutineCall {
        name: SymbolId,
        original_name: Option<SymbolId>,
        args: Vec<Option<ExprId>>,
        dt: Option<ExprId>,
    },
    Return,
    Exit,
    Cycle,
    GoTo {
        target_id: i64,
        name: String,
    },
    /// Enter the block `m`; `label` is the target of `GoTo` statements jumping to it.
    BlockCall {
        label: i64,
        m: SymbolId,
    },
    Allocate {
        args: Vec<Allocation>,
    },
    ExplicitDeallocate {
        vars: Vec<ExprId>,
    },
}

impl StmtKind {
    /// Direct child expressions, in evaluation order.
    pub fn exprs(&self) -> Vec<ExprId> {
        use StmtKind::*;
        match self {
            Assignment { target, value } => vec![*target, *value],
            DoLoop { head, .. } => {
                let mut out = vec![head.v, head.start, head.end];
                out.extend(head.increment);
                out
            }
            If { test, .. } | Where { test, .. } => vec![*test],
            Print { values, separator, end } => {
                values.iter().copied().chain(*separator).chain(*end).collect()
            }
            SubroutineCall { args, dt, .. } => dt.iter().copied().chain(args.iter().flatten().copied()).collect(),
            Allocate { args } => args
                .iter()
                .flat_map(|alloc| {
                    std::iter::once(alloc.a)
                        .chain(alloc.dims.iter().flat_map(|d| d.start.into_iter().chain(d.length)))
                })
                .collect(),
            ExplicitDeallocate { vars } => vars.clone(),
            Return | Exit | Cycle | GoTo { .. } | BlockCall { .. } => vec![],
        }
    }

    /// Mutable references to the slots returned by [`StmtKind::exprs`], in the same order.
    pub fn exprs_mut(&mut self) -> Vec<&mut ExprId> {
        use StmtKind::*;
        match self {
            Assignment { target, value } => vec![target, value],
            DoLoop { head, .. } => {
                let DoLoopHead { v, start, end, increment } = head;
                [v, start, end].into_iter().chain(increment.iter_mut()).collect()
            }
            If { test, .. } | Where { test, .. } => vec![test],
            Print { values, separator, end } => {
                values.iter_mut().chain(separator.iter_mut()).chain(end.iter_mut()).collect()
            }
            SubroutineCall { args, dt, .. } => {
                dt.iter_mut().chain(args.iter_mut().flatten()).collect()
            }
            Allocate { args } => args
                .iter_mut()
                .flat_map(|alloc| {
                    std::iter::once(&mut alloc.a).chain(
                        alloc.dims.iter_mut().flat_map(|d| d.start.iter_mut().chain(d.length.iter_mut())),
                    )
                })
                .collect(),
            ExplicitDeallocate { vars } => vars.iter_mut().collect(),
            Return | Exit | Cycle | GoTo { .. } | BlockCall { .. } => vec![],
        }
    }

    /// Nested statement lists, in source order.
    pub fn bodies(&self) -> Vec<&Vec<StmtId>> {
        match self {
            StmtKind::DoLoop { body, .. } => vec![body],
            StmtKind::If { body, orelse, .. } | StmtKind::Where { body, orelse, .. } => {
                vec![body, orelse]
            }
            _ => vec![],
        }
    }

    pub fn bodies_mut(&mut self) -> Vec<&mut Vec<StmtId>> {
        match self {
            StmtKind::DoLoop { body, .. } => vec![body],
            StmtKind::If { body, orelse, .. } | StmtKind::Where { body, orelse, .. } => {
                vec![body, orelse]
            }
            _ => vec![],
        }
    }
}
