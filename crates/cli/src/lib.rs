//! Public library modules for the CLI crate
pub mod export;
pub mod server;
pub mod watch;
