//! Session and long-term memory.
//!
//! [`SessionStore`] hands out per-run [`SessionMemory`] that lives only in
//! process memory. [`LongTermMemory`] is a durable JSON-backed store shared
//! by every run in the process.

pub mod long_term;
pub mod session;

pub use long_term::{LongTermMemory, MemoryError, LIST_FIELD};
pub use session::{ConversationTurn, SessionMemory, SessionStore};
