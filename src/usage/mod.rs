pub mod models;
pub mod pricing;
pub mod report;
pub mod scanner;
pub mod types;

pub use scanner::{scan_projects, ScanOptions};
