pub mod document;
pub mod filter;
pub mod models;
