use std::fmt;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }
    };
}

arena_id!(
    /// Handle of a symbol stored in an [`Asr`](crate::Asr).
    SymbolId,
    "sym#"
);
arena_id!(
    /// Handle of a symbol table stored in an [`Asr`](crate::Asr).
    ///
    /// This is an arena index, not the table's `counter`: the counter is the identity
    /// that survives serialization, the handle is only meaningful within one arena.
    SymtabId,
    "tab#"
);
arena_id!(
    /// Handle of an expression node.
    ExprId,
    "expr#"
);
arena_id!(
    /// Handle of a statement node.
    StmtId,
    "stmt#"
);
