//! Symbol libraries (`.lib` files) referenced by `LIBS:` declarations.

mod parser;
mod symbol;

pub use parser::parse_library;
pub use symbol::{Fill, PinDirection, Symbol, SymbolItem, SymbolLibrary, UnitScope};
