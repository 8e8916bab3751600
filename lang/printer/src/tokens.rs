//! Delimiters and node heads used when we prettyprint an ASR tree.

// Delimiters
//
//

pub const LPAREN: &str = "(";
pub const RPAREN: &str = ")";
pub const LBRACKET: &str = "[";
pub const RBRACKET: &str = "]";
pub const LBRACE: &str = "{";
pub const RBRACE: &str = "}";

/// The symbol `:`
pub const COLON: &str = ":";

/// The symbol `,`
pub const COMMA: &str = ",";

/// Printed in place of an absent optional child.
pub const NONE: &str = "()";

// Node heads
//
//

pub const TRANSLATION_UNIT: &str = "TranslationUnit";
pub const SYMBOL_TABLE: &str = "SymbolTable";

pub const PROGRAM: &str = "Program";
pub const MODULE: &str = "Module";
pub const FUNCTION: &str = "Function";
pub const GENERIC_PROCEDURE: &str = "GenericProcedure";
pub const VARIABLE: &str = "Variable";
pub const STRUCT_TYPE: &str = "StructType";
pub const EXTERNAL_SYMBOL: &str = "ExternalSymbol";
pub const CLASS_PROCEDURE: &str = "ClassProcedure";
pub const BLOCK: &str = "Block";
