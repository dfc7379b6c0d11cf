pub mod book_spec;
pub mod config;
pub mod error;
pub mod io;
pub mod plan;
pub mod state;
