//! vfsplit command line tool.

pub mod cli;
pub mod info;
pub mod io;
pub mod sample;

pub use cli::Cli;
