mod chat;
mod protocol;
pub mod routes;
mod server;

pub use chat::relay_chat;
pub use protocol::*;
pub use server::*;
