use crate::{ExprId, SymbolId};

/// The type of an expression or variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ttype {
    Integer { kind: u8 },
    Real { kind: u8 },
    Complex { kind: u8 },
    Logical { kind: u8 },
    /// A character string of fixed length; `len < 0` means the length is deferred.
    Character { kind: u8, len: i64 },
    /// An instance of the derived type `derived_type` (a `StructType`, possibly reached
    /// through an `ExternalSymbol`).
    Struct { derived_type: SymbolId },
    /// A type parameter of a generic function, bound at instantiation.
    TypeParameter { param: String },
    Array { elem: Box<Ttype>, dims: Vec<Dimension> },
    Pointer(Box<Ttype>),
    Allocatable(Box<Ttype>),
    List(Box<Ttype>),
    Tuple(Vec<Ttype>),
}

/// One axis of an array type: lower bound and extent.
///
/// A missing `length` is an assumed- or deferred-shape axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimension {
    pub start: Option<ExprId>,
    pub length: Option<ExprId>,
}

impl Ttype {
    pub fn int() -> Ttype {
        Ttype::Integer { kind: 4 }
    }

    pub fn real() -> Ttype {
        Ttype::Real { kind: 8 }
    }

    pub fn logical() -> Ttype {
        Ttype::Logical { kind: 4 }
    }

    pub fn character(len: i64) -> Ttype {
        Ttype::Character { kind: 1, len }
    }

    pub fn array(elem: Ttype, dims: Vec<Dimension>) -> Ttype {
        Ttype::Array { elem: Box::new(elem), dims }
    }

    /// Strip `Pointer` and `Allocatable` wrappers.
    pub fn past_wrappers(&self) -> &Ttype {
        match self {
            Ttype::Pointer(inner) | Ttype::Allocatable(inner) => inner.past_wrappers(),
            other => other,
        }
    }

    /// The element type of an array type, or the type itself.
    pub fn past_array(&self) -> &Ttype {
        match self.past_wrappers() {
            Ttype::Array { elem, .. } => elem,
            other => other,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self.past_wrappers(), Ttype::Array { .. })
    }

    pub fn is_allocatable(&self) -> bool {
        matches!(self, Ttype::Allocatable(_))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Ttype::Pointer(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.past_wrappers(), Ttype::Integer { .. })
    }

    pub fn is_character(&self) -> bool {
        matches!(self.past_wrappers(), Ttype::Character { .. })
    }

    pub fn dims(&self) -> &[Dimension] {
        match self.past_wrappers() {
            Ttype::Array { dims, .. } => dims,
            _ => &[],
        }
    }

    pub fn rank(&self) -> usize {
        self.dims().len()
    }

    /// Whether the type mentions any type parameter.
    pub fn is_generic(&self) -> bool {
        match self {
            Ttype::TypeParameter { .. } => true,
            Ttype::Array { elem, .. } => elem.is_generic(),
            Ttype::Pointer(inner) | Ttype::Allocatable(inner) | Ttype::List(inner) => {
                inner.is_generic()
            }
            Ttype::Tuple(elems) => elems.iter().any(Ttype::is_generic),
            _ => false,
        }
    }

    /// Structural type equality as used for argument matching: kinds must agree,
    /// arrays must agree in element type and rank but not in their bounds, and
    /// `Pointer`/`Allocatable` wrappers are ignored.
    pub fn same_as(&self, other: &Ttype) -> bool {
        use Ttype::*;
        match (self.past_wrappers(), other.past_wrappers()) {
            (Integer { kind: a }, Integer { kind: b })
            | (Real { kind: a }, Real { kind: b })
            | (Complex { kind: a }, Complex { kind: b })
            | (Logical { kind: a }, Logical { kind: b })
            | (Character { kind: a, .. }, Character { kind: b, .. }) => a == b,
            (Struct { derived_type: a }, Struct { derived_type: b }) => a == b,
            (TypeParameter { param: a }, TypeParameter { param: b }) => a == b,
            (Array { elem: a, dims: da }, Array { elem: b, dims: db }) => {
                da.len() == db.len() && a.same_as(b)
            }
            (List(a), List(b)) => a.same_as(b),
            (Tuple(a), Tuple(b)) => a.len() == b.len() && a.iter().zip(b).all(|(a, b)| a.same_as(b)),
            _ => false,
        }
    }

    /// A short, identifier-safe rendering used to build names of generated symbols.
    pub fn mangle(&self) -> String {
        match self {
            Ttype::Integer { kind } => format!("i{kind}"),
            Ttype::Real { kind } => format!("r{kind}"),
            Ttype::Complex { kind } => format!("c{kind}"),
            Ttype::Logical { kind } => format!("l{kind}"),
            Ttype::Character { kind, .. } => format!("s{kind}"),
            Ttype::Struct { derived_type } => format!("T{}", derived_type.index()),
            Ttype::TypeParameter { param } => param.clone(),
            Ttype::Array { elem, dims } => format!("{}_{}d", elem.mangle(), dims.len()),
            Ttype::Pointer(inner) => format!("p{}", inner.mangle()),
            Ttype::Allocatable(inner) => format!("a{}", inner.mangle()),
            Ttype::List(inner) => format!("list_{}", inner.mangle()),
            Ttype::Tuple(elems) => {
                let elems: Vec<_> = elems.iter().map(Ttype::mangle).collect();
                format!("tuple_{}", elems.join("_"))
            }
        }
    }

    /// The child expressions stored in array dimensions, outermost type first.
    pub fn dim_exprs(&self) -> Vec<ExprId> {
        let mut out = Vec::new();
        self.collect_dim_exprs(&mut out);
        out
    }

    fn collect_dim_exprs(&self, out: &mut Vec<ExprId>) {
        match self {
            Ttype::Array { elem, dims } => {
                for dim in dims {
                    out.extend(dim.start);
                    out.extend(dim.length);
                }
                elem.collect_dim_exprs(out);
            }
            Ttype::Pointer(inner) | Ttype::Allocatable(inner) | Ttype::List(inner) => {
                inner.collect_dim_exprs(out)
            }
            Ttype::Tuple(elems) => elems.iter().for_each(|t| t.collect_dim_exprs(out)),
            _ => {}
        }
    }

    /// Apply `f` to every dimension expression slot.
    pub fn map_dim_exprs<F: FnMut(ExprId) -> ExprId>(&mut self, f: &mut F) {
        match self {
            Ttype::Array { elem, dims } => {
                for dim in dims {
                    dim.start = dim.start.map(&mut *f);
                    dim.length = dim.length.map(&mut *f);
                }
                elem.map_dim_exprs(f);
            }
            Ttype::Pointer(inner) | Ttype::Allocatable(inner) | Ttype::List(inner) => {
                inner.map_dim_exprs(f)
            }
            Ttype::Tuple(elems) => elems.iter_mut().for_each(|t| t.map_dim_exprs(f)),
            _ => {}
        }
    }

    /// Replace type parameters by the types bound to them.
    pub fn substitute(&self, bindings: &[(String, Ttype)]) -> Ttype {
        match self {
            Ttype::TypeParameter { param } => bindings
                .iter()
                .find(|(name, _)| name == param)
                .map(|(_, ty)| ty.clone())
                .unwrap_or_else(|| self.clone()),
            Ttype::Array { elem, dims } => {
                Ttype::Array { elem: Box::new(elem.substitute(bindings)), dims: dims.clone() }
            }
            Ttype::Pointer(inner) => Ttype::Pointer(Box::new(inner.substitute(bindings))),
            Ttype::Allocatable(inner) => Ttype::Allocatable(Box::new(inner.substitute(bindings))),
            Ttype::List(inner) => Ttype::List(Box::new(inner.substitute(bindings))),
            Ttype::Tuple(elems) => Ttype::Tuple(elems.iter().map(|t| t.substitute(bindings)).collect()),
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_as_ignores_wrappers_and_bounds() {
        let a = Ttype::array(Ttype::int(), vec![Dimension::default()]);
        let b = Ttype::Allocatable(Box::new(Ttype::array(Ttype::int(), vec![Dimension::default()])));
        assert!(a.same_as(&b));
        assert!(!a.same_as(&Ttype::int()));
        assert!(!Ttype::int().same_as(&Ttype::Integer { kind: 8 }));
    }

    #[test]
    fn substitute_binds_nested_parameters() {
        let generic = Ttype::array(Ttype::TypeParameter { param: "T".to_owned() }, vec![]);
        let bound = generic.substitute(&[("T".to_owned(), Ttype::real())]);
        assert_eq!(bound, Ttype::array(Ttype::real(), vec![]));
        assert!(generic.is_generic());
        assert!(!bound.is_generic());
    }
}
