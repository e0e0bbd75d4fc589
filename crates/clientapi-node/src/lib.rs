pub mod config;
pub mod dispatch;
pub mod server;

pub use dispatch::{CommandHandler, CommandRegistry, CompositeCommand, Dispatcher};
pub use server::{BridgeServer, ServerHandle};
