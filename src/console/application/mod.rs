pub mod backend;
pub mod document_actions;
