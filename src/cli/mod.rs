pub mod args;
pub mod shell;

pub use args::{Cli, Command};
pub use shell::Shell;
