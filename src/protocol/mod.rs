//! The multi-step command protocol.

mod command;
mod dispatcher;
mod outbound;
pub mod render;

pub use command::Command;
pub use dispatcher::Dispatcher;
pub use outbound::{Control, DispatchResult, Inbound, Outbound, Payload};
