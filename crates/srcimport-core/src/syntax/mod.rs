//! Lexical scanning of C# source text.
//!
//! This module is the parse/serialize capability the combination engine sits
//! on: enough of a C# lexer to find preprocessor directives, decide which
//! regions of the file are active under a given set of defined symbols,
//! locate namespace and type declarations inside those regions, and splice
//! edits back into the text without disturbing anything else.
//!
//! It is deliberately not a full parser. Directive discovery and region
//! tracking need exact lexical fidelity (directives are invisible inside
//! comments and string literals, including verbatim, interpolated, and raw
//! forms); declaration discovery needs only brace-level structure.

pub mod condition;
mod scanner;
mod source_tree;

pub use scanner::{DirectiveKind, RawDirective, Scan, ScanError, scan};
pub use source_tree::{Edit, NamespaceDecl, SourceTree, SyntaxError, TypeDecl, TypeKind};
