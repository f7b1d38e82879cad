//! Inbox adapters.

mod memory;

pub use memory::InMemoryMirror;
