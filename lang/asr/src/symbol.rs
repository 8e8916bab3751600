use std::fmt;

use serde_derive::{Deserialize, Serialize};

use crate::{ExprId, HasLocation, Location, StmtId, SymbolId, SymtabId, Ttype};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    Local,
    In,
    Out,
    InOut,
    ReturnVar,
    Unspecified,
}

impl Intent {
    /// Whether a variable with this intent is a dummy argument of its procedure.
    pub fn is_argument(self) -> bool {
        matches!(self, Intent::In | Intent::Out | Intent::InOut | Intent::Unspecified)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Storage {
    Default,
    Save,
    /// A named constant; its `value` is always present.
    Parameter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Access {
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Abi {
    Source,
    Intrinsic,
    BindC,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefType {
    Implementation,
    Interface,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub loc: Location,
    pub symtab: SymtabId,
    pub name: String,
    pub dependencies: Vec<String>,
    pub body: Vec<StmtId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub loc: Location,
    pub symtab: SymtabId,
    pub name: String,
    /// Names of the modules this one uses.
    pub dependencies: Vec<String>,
    pub loaded_from_mod: bool,
    pub intrinsic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub loc: Location,
    pub symtab: SymtabId,
    pub name: String,
    /// Dummy arguments, each a `Var` of a variable in `symtab`.
    pub args: Vec<ExprId>,
    pub body: Vec<StmtId>,
    /// `Var` of the result variable; `None` for subroutines.
    pub return_var: Option<ExprId>,
    pub dependencies: Vec<String>,
    /// Names of the type parameters of a generic function.
    pub type_params: Vec<String>,
    pub abi: Abi,
    pub access: Access,
    pub deftype: DefType,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenericProcedure {
    pub loc: Location,
    pub parent_symtab: SymtabId,
    pub name: String,
    pub procs: Vec<SymbolId>,
    pub access: Access,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub loc: Location,
    pub parent_symtab: SymtabId,
    pub name: String,
    pub intent: Intent,
    /// The initializer as written.
    pub symbolic_value: Option<ExprId>,
    /// The folded initializer.
    pub value: Option<ExprId>,
    pub storage: Storage,
    pub ty: Ttype,
    pub abi: Abi,
    pub access: Access,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
    pub loc: Location,
    pub symtab: SymtabId,
    pub name: String,
    pub dependencies: Vec<String>,
    /// Member names in declaration order.
    pub members: Vec<String>,
    pub abi: Abi,
    pub access: Access,
    /// The type this one extends.
    pub parent: Option<SymbolId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExternalSymbol {
    pub loc: Location,
    pub parent_symtab: SymtabId,
    pub name: String,
    /// The symbol this one stands for; `None` until linked.
    pub external: Option<SymbolId>,
    pub module_name: String,
    /// Names of the symbols enclosing `original_name` inside the module, outermost first.
    pub scope_names: Vec<String>,
    pub original_name: String,
    pub access: Access,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassProcedure {
    pub loc: Location,
    pub parent_symtab: SymtabId,
    pub name: String,
    pub self_argument: Option<String>,
    pub proc_name: String,
    pub proc: SymbolId,
    pub abi: Abi,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub loc: Location,
    pub symtab: SymtabId,
    pub name: String,
    pub body: Vec<StmtId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Program(Program),
    Module(Module),
    Function(Function),
    GenericProcedure(GenericProcedure),
    Variable(Variable),
    StructType(StructType),
    ExternalSymbol(ExternalSymbol),
    ClassProcedure(ClassProcedure),
    Block(Block),
}

/// The variant of a [`Symbol`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Program,
    Module,
    Function,
    GenericProcedure,
    Variable,
    StructType,
    ExternalSymbol,
    ClassProcedure,
    Block,
}

impl SymbolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Program => "program",
            SymbolKind::Module => "module",
            SymbolKind::Function => "function",
            SymbolKind::GenericProcedure => "generic procedure",
            SymbolKind::Variable => "variable",
            SymbolKind::StructType => "derived type",
            SymbolKind::ExternalSymbol => "external symbol",
            SymbolKind::ClassProcedure => "class procedure",
            SymbolKind::Block => "block",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Symbol {
    pub fn kind(&self) -> SymbolKind {
        match self {
            Symbol::Program(_) => SymbolKind::Program,
            Symbol::Module(_) => SymbolKind::Module,
            Symbol::Function(_) => SymbolKind::Function,
            Symbol::GenericProcedure(_) => SymbolKind::GenericProcedure,
            Symbol::Variable(_) => SymbolKind::Variable,
            Symbol::StructType(_) => SymbolKind::StructType,
            Symbol::ExternalSymbol(_) => SymbolKind::ExternalSymbol,
            Symbol::ClassProcedure(_) => SymbolKind::ClassProcedure,
            Symbol::Block(_) => SymbolKind::Block,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Symbol::Program(x) => &x.name,
            Symbol::Module(x) => &x.name,
            Symbol::Function(x) => &x.name,
            Symbol::GenericProcedure(x) => &x.name,
            Symbol::Variable(x) => &x.name,
            Symbol::StructType(x) => &x.name,
            Symbol::ExternalSymbol(x) => &x.name,
            Symbol::ClassProcedure(x) => &x.name,
            Symbol::Block(x) => &x.name,
        }
    }

    pub fn set_name(&mut self, name: String) {
        match self {
            Symbol::Program(x) => x.name = name,
            Symbol::Module(x) => x.name = name,
            Symbol::Function(x) => x.name = name,
            Symbol::GenericProcedure(x) => x.name = name,
            Symbol::Variable(x) => x.name = name,
            Symbol::StructType(x) => x.name = name,
            Symbol::ExternalSymbol(x) => x.name = name,
            Symbol::ClassProcedure(x) => x.name = name,
            Symbol::Block(x) => x.name = name,
        }
    }

    /// The table owned by this symbol, for scope-owning variants.
    pub fn symtab(&self) -> Option<SymtabId> {
        match self {
            Symbol::Program(x) => Some(x.symtab),
            Symbol::Module(x) => Some(x.symtab),
            Symbol::Function(x) => Some(x.symtab),
            Symbol::StructType(x) => Some(x.symtab),
            Symbol::Block(x) => Some(x.symtab),
            Symbol::GenericProcedure(_)
            | Symbol::Variable(_)
            | Symbol::ExternalSymbol(_)
            | Symbol::ClassProcedure(_) => None,
        }
    }

    /// The table this symbol is registered in, for variants that store it directly.
    ///
    /// Scope-owning symbols do not store it: their table's `parent` is that table.
    pub fn stored_parent_symtab(&self) -> Option<SymtabId> {
        match self {
            Symbol::GenericProcedure(x) => Some(x.parent_symtab),
            Symbol::Variable(x) => Some(x.parent_symtab),
            Symbol::ExternalSymbol(x) => Some(x.parent_symtab),
            Symbol::ClassProcedure(x) => Some(x.parent_symtab),
            _ => None,
        }
    }

    pub fn set_stored_parent_symtab(&mut self, parent: SymtabId) {
        match self {
            Symbol::GenericProcedure(x) => x.parent_symtab = parent,
            Symbol::Variable(x) => x.parent_symtab = parent,
            Symbol::ExternalSymbol(x) => x.parent_symtab = parent,
            Symbol::ClassProcedure(x) => x.parent_symtab = parent,
            _ => {}
        }
    }

    /// Names of the modules a scope-owning symbol depends on.
    pub fn dependencies(&self) -> &[String] {
        match self {
            Symbol::Program(x) => &x.dependencies,
            Symbol::Module(x) => &x.dependencies,
            Symbol::Function(x) => &x.dependencies,
            Symbol::StructType(x) => &x.dependencies,
            _ => &[],
        }
    }

    /// The statement list of symbols that have one.
    pub fn body(&self) -> Option<&Vec<StmtId>> {
        match self {
            Symbol::Program(x) => Some(&x.body),
            Symbol::Function(x) => Some(&x.body),
            Symbol::Block(x) => Some(&x.body),
            _ => None,
        }
    }

    pub fn body_mut(&mut self) -> Option<&mut Vec<StmtId>> {
        match self {
            Symbol::Program(x) => Some(&mut x.body),
            Symbol::Function(x) => Some(&mut x.body),
            Symbol::Block(x) => Some(&mut x.body),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Symbol::Variable(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_variable_mut(&mut self) -> Option<&mut Variable> {
        match self {
            Symbol::Variable(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Symbol::Function(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_function_mut(&mut self) -> Option<&mut Function> {
        match self {
            Symbol::Function(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_module(&self) -> Option<&Module> {
        match self {
            Symbol::Module(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_module_mut(&mut self) -> Option<&mut Module> {
        match self {
            Symbol::Module(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_struct_type(&self) -> Option<&StructType> {
        match self {
            Symbol::StructType(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_external(&self) -> Option<&ExternalSymbol> {
        match self {
            Symbol::ExternalSymbol(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_external_mut(&mut self) -> Option<&mut ExternalSymbol> {
        match self {
            Symbol::ExternalSymbol(x) => Some(x),
            _ => None,
        }
    }
}

impl HasLocation for Symbol {
    fn loc(&self) -> Location {
        match self {
            Symbol::Program(x) => x.loc,
            Symbol::Module(x) => x.loc,
            Symbol::Function(x) => x.loc,
            Symbol::GenericProcedure(x) => x.loc,
            Symbol::Variable(x) => x.loc,
            Symbol::StructType(x) => x.loc,
            Symbol::ExternalSymbol(x) => x.loc,
            Symbol::ClassProcedure(x) => x.loc,
            Symbol::Block(x) => x.loc,
        }
    }
}

macro_rules! impl_from_symbol {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Symbol {
                fn from(val: $variant) -> Self {
                    Symbol::$variant(val)
                }
            }
        )*
    };
}

impl_from_symbol!(
    Program,
    Module,
    Function,
    GenericProcedure,
    Variable,
    StructType,
    ExternalSymbol,
    ClassProcedure,
    Block
);
