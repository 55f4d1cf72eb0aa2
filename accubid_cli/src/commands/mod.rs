//! CLI subcommand implementations.

pub mod databases;
pub mod objects;
pub mod projects;
pub mod read;
pub mod test_connection;
