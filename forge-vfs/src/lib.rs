pub mod config;
pub mod error;
pub mod history;
pub mod path;
pub mod protocol;
pub mod server;
pub mod session;
pub mod store;
pub mod tools;
pub mod transport;
pub mod vfs;
