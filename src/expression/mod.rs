pub(crate) mod ast;
pub(crate) mod error;
pub(crate) mod eval;
pub(crate) mod filter;
pub(crate) mod lexer;
pub(crate) mod parser;
