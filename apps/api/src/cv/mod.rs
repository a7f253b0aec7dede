// CV documents: editor commands, persistence and JSON import/export.

pub mod commands;
pub mod handlers;
pub mod store;
pub mod transfer;
