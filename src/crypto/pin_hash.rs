//! PIN hashing with Argon2id
//!
//! Hashes are stored in the self-describing PHC string format
//! (`$argon2id$v=19$m=16384,t=3,p=1$<salt>$<digest>`), so a stored hash
//! carries everything needed to verify it even after the defaults change.
//! In memory the hash is a tagged record, [`PinHash`], with a
//! `Display`/`FromStr` pair at the storage boundary.

use std::fmt;
use std::str::FromStr;

use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::password_hash::Output;
use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
use serde::{Deserialize, Serialize};

use crate::error::{PassbookError, PassbookResult};

/// Cost parameters for the key derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinHashParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub time_cost: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for PinHashParams {
    fn default() -> Self {
        Self {
            memory_kib: 16 * 1024, // 16 MiB
            time_cost: 3,
            parallelism: 1,
        }
    }
}

/// Salt length for new hashes
pub const SALT_LEN: usize = 16;

/// Digest length for new hashes
pub const DIGEST_LEN: usize = 32;

/// A parsed PIN hash: algorithm, version, parameters, salt and digest
#[derive(Clone, PartialEq, Eq)]
pub struct PinHash {
    pub algorithm: Algorithm,
    pub version: Version,
    pub params: PinHashParams,
    pub salt: Vec<u8>,
    pub digest: Vec<u8>,
}

impl PinHash {
    /// Hash a PIN with a fresh random salt and the given parameters
    pub fn create(pin: &[u8], params: PinHashParams) -> PassbookResult<Self> {
        let mut salt = vec![0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let digest = derive(
            Algorithm::Argon2id,
            Version::V0x13,
            params,
            pin,
            &salt,
            DIGEST_LEN,
        )?;

        Ok(Self {
            algorithm: Algorithm::Argon2id,
            version: Version::V0x13,
            params,
            salt,
            digest,
        })
    }

    /// Check a PIN against this hash
    ///
    /// The digest is recomputed with the stored algorithm, parameters, salt
    /// and digest length, then compared in constant time.
    pub fn verify(&self, pin: &[u8]) -> PassbookResult<bool> {
        let computed = derive(
            self.algorithm,
            self.version,
            self.params,
            pin,
            &self.salt,
            self.digest.len(),
        )?;

        let expected = Output::new(&self.digest)
            .map_err(|e| PassbookError::Credential(format!("Invalid stored digest: {}", e)))?;
        let actual = Output::new(&computed)
            .map_err(|e| PassbookError::Credential(format!("Invalid computed digest: {}", e)))?;

        // Output's equality is constant-time
        Ok(expected == actual)
    }
}

fn derive(
    algorithm: Algorithm,
    version: Version,
    params: PinHashParams,
    pin: &[u8],
    salt: &[u8],
    digest_len: usize,
) -> PassbookResult<Vec<u8>> {
    let argon2_params = Params::new(
        params.memory_kib,
        params.time_cost,
        params.parallelism,
        Some(digest_len),
    )
    .map_err(|e| PassbookError::Credential(format!("Invalid Argon2 parameters: {}", e)))?;

    let argon2 = Argon2::new(algorithm, version, argon2_params);

    let mut digest = vec![0u8; digest_len];
    argon2
        .hash_password_into(pin, salt, &mut digest)
        .map_err(|e| PassbookError::Credential(format!("PIN hashing failed: {}", e)))?;

    Ok(digest)
}

impl fmt::Display for PinHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "${}$v={}$m={},t={},p={}${}${}",
            self.algorithm.as_str(),
            u32::from(self.version),
            self.params.memory_kib,
            self.params.time_cost,
            self.params.parallelism,
            STANDARD_NO_PAD.encode(&self.salt),
            STANDARD_NO_PAD.encode(&self.digest),
        )
    }
}

// The salt and digest are secret material; print only the descriptor.
impl fmt::Debug for PinHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinHash")
            .field("algorithm", &self.algorithm)
            .field("version", &self.version)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl FromStr for PinHash {
    type Err = PassbookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |what: &str| PassbookError::Credential(format!("Invalid PIN hash: {}", what));

        // Leading '$' yields an empty first segment
        let parts: Vec<&str> = s.split('$').collect();
        if parts.len() != 6 || !parts[0].is_empty() {
            return Err(invalid("expected 5 '$'-separated fields"));
        }

        let algorithm = Algorithm::new(parts[1]).map_err(|_| invalid("unsupported algorithm"))?;

        let version = parts[2]
            .strip_prefix("v=")
            .and_then(|v| v.parse::<u32>().ok())
            .and_then(|v| Version::try_from(v).ok())
            .ok_or_else(|| invalid("bad version"))?;

        let mut memory_kib = None;
        let mut time_cost = None;
        let mut parallelism = None;
        for pair in parts[3].split(',') {
            let (name, value) = pair.split_once('=').ok_or_else(|| invalid("bad parameter"))?;
            let value: u32 = value.parse().map_err(|_| invalid("bad parameter value"))?;
            match name {
                "m" => memory_kib = Some(value),
                "t" => time_cost = Some(value),
                "p" => parallelism = Some(value),
                _ => return Err(invalid("unknown parameter")),
            }
        }
        let params = PinHashParams {
            memory_kib: memory_kib.ok_or_else(|| invalid("missing m"))?,
            time_cost: time_cost.ok_or_else(|| invalid("missing t"))?,
            parallelism: parallelism.ok_or_else(|| invalid("missing p"))?,
        };

        let salt = STANDARD_NO_PAD
            .decode(parts[4])
            .map_err(|_| invalid("salt is not base64"))?;
        let digest = STANDARD_NO_PAD
            .decode(parts[5])
            .map_err(|_| invalid("digest is not base64"))?;
        if salt.is_empty() || digest.is_empty() {
            return Err(invalid("empty salt or digest"));
        }

        Ok(Self {
            algorithm,
            version,
            params,
            salt,
            digest,
        })
    }
}
