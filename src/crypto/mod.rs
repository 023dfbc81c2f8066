//! Cryptographic helpers for Passbook
//!
//! Argon2id PIN hashing and zero-on-drop PIN buffers.

pub mod pin_hash;
pub mod secure_memory;

pub use pin_hash::{PinHash, PinHashParams};
pub use secure_memory::SecurePin;
