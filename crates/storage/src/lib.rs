//! Persistence for agreement renewal.
//!
//! Defines the [`AgreementStore`] trait the renewal workflow runs against,
//! the record types it reads and writes, and [`MemoryStore`], an in-memory
//! backend. Backends can verify themselves with [`conformance`].

pub mod conformance;
mod error;
mod memory;
mod record;
mod traits;

pub use error::StorageError;
pub use memory::{MemorySnapshot, MemoryStore};
pub use record::{
    sort_newest_first, AgreementPatch, ChangeLogEntry, Message, MessageKind, NewAgreement,
    NewChangeLogEntry, NewMessage, WriteAccess, NEW_AGREEMENT_NAME,
};
pub use traits::AgreementStore;
