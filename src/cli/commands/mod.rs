pub mod article;
pub mod report;
