//! Vault module: credential entries and their encrypted storage.
//!
//! - Big-endian framing primitives (`bytes`)
//! - The `Entry` record and its validation rules (`entry`)
//! - Group paths, display ordering and pointer dictionary (`groups`)
//! - The binary payload codec (`format`)
//! - High-level `VaultStore` for creating, opening and editing vaults (`store`)

pub mod bytes;
pub mod entry;
pub mod format;
pub mod groups;
pub mod store;

pub use entry::{Entry, EntryField, NewEntry};
pub use format::{decode_payload, encode_payload, DecodedPayload};
pub use groups::{name_groups, NameGroups};
pub use store::{ListedEntry, VaultOptions, VaultStore};
