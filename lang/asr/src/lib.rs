//! The abstract semantic representation (ASR).
//!
//! All nodes of one translation unit live in a single [`Asr`] arena and refer to each
//! other through copyable handles ([`SymbolId`], [`SymtabId`], [`ExprId`], [`StmtId`]).
//! Nothing is freed before the arena is dropped: rewriting a tree means allocating new
//! nodes and redirecting the handles that pointed at the old ones.

mod arena;
pub mod builder;
pub mod deps;
pub mod duplicate;
mod expr;
pub mod external;
mod ids;
mod print;
mod result;
mod stmt;
mod symbol;
mod symtab;
mod ttype;
pub mod utils;
pub mod visit;

pub use arena::*;
pub use expr::*;
pub use ids::*;
pub use result::*;
pub use stmt::*;
pub use symbol::*;
pub use symtab::*;
pub use ttype::*;

pub use lasr_lang_miette_util::Location;

pub type HashMap<K, V> = fxhash::FxHashMap<K, V>;
pub type HashSet<V> = fxhash::FxHashSet<V>;

/// Trait for nodes which carry a source location.
///
/// Nodes synthesized by a transformation pass carry the location of the construct they
/// were generated from, or [`Location::initial`] if there is none.
pub trait HasLocation {
    fn loc(&self) -> Location;
}
