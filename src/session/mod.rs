//! Session management: per-participant authorization and
//! conversation state.

mod pending;
mod store;

pub use pending::{PendingCommand, RunningApp};
pub use store::{ChatId, Session, SessionStore};
