// src/extractors/mod.rs
pub mod balance_sheet;
pub mod normalize;
pub mod patterns;

// Re-export key extraction types for convenience
#[allow(unused_imports)]
pub use balance_sheet::{BalanceSheetExtractor, FieldState, LineItems, Resolution};
#[allow(unused_imports)]
pub use normalize::{HtmlDocument, Row, Table, TableSource};
