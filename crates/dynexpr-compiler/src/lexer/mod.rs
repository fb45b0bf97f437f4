//! Tokenization of expression source text.

mod cursor;
mod lexer;
mod token;

pub use cursor::Cursor;
pub use lexer::Lexer;
pub use token::{Token, TokenKind};
