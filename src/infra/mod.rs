mod auth;
mod chat;
mod config;
mod notes;
mod subscribe;
mod watch;

pub use auth::*;
pub use chat::*;
pub use config::*;
pub use notes::*;
pub use subscribe::*;
pub use watch::*;
