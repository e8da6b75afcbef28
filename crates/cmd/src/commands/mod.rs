pub mod build;
pub mod check;
pub mod watch;

pub use build::build_command;
pub use check::check_command;
pub use watch::watch_command;
