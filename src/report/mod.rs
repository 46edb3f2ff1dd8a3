// src/report/mod.rs
pub mod models;

pub use models::{ExtractionResult, ReportMetadata};
