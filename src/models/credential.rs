//! Stored PIN credential

use chrono::{DateTime, Utc};

use crate::crypto::PinHash;

/// The single configured PIN, kept only as its hash
#[derive(Debug, Clone)]
pub struct Credential {
    pub pin_hash: PinHash,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(pin_hash: PinHash, now: DateTime<Utc>) -> Self {
        Self {
            pin_hash,
            created_at: now,
            updated_at: now,
        }
    }

    /// Swap in a new hash, keeping the original creation time
    pub fn replace_hash(&mut self, pin_hash: PinHash, now: DateTime<Utc>) {
        self.pin_hash = pin_hash;
        self.updated_at = now;
    }
}
