//! Loopback listener that receives the authorization redirect for
//! command-line use.

mod config;
mod http;
mod server;
mod target;

pub use config::LocalServerConfig;
pub use server::LocalServer;
