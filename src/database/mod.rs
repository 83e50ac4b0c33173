//! Relational side of the conversion: identifiers, regions, column typing and table definitions.

pub mod column;
pub mod identifier;
pub mod range;
pub mod table;
