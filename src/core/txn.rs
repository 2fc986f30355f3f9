//! Ledger-native transaction model: address codec, canonical encoding,
//! transaction ids and ed25519 signing.
//!
//! The wire format is canonical msgpack: map keys in sorted order (field
//! declaration order below) and zero-value fields omitted. Signatures are
//! ed25519 over `"TX" || encoding`; the transaction id is the base32 form of
//! the SHA-512/256 digest of the same bytes.

use crate::core::error::EtfError;
use crate::core::ledger::NetworkParams;
use data_encoding::BASE32_NOPAD;
use ed25519_dalek::{Signer as _, SigningKey};
use serde::de::Visitor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha512_256};
use std::fmt;
use std::path::Path;

const CHECKSUM_LEN: usize = 4;

/// A 32-byte public key, displayed as base32 with a 4-byte checksum suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address(pub [u8; 32]);

fn checksum(public_key: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = Sha512_256::digest(public_key);
    let mut check = [0u8; CHECKSUM_LEN];
    check.copy_from_slice(&digest[digest.len() - CHECKSUM_LEN..]);
    check
}

impl Address {
    pub fn decode(encoded: &str) -> Result<Self, EtfError> {
        let bytes = BASE32_NOPAD
            .decode(encoded.as_bytes())
            .map_err(|e| EtfError::Address {
                address: encoded.to_string(),
                reason: format!("not valid base32: {e}"),
            })?;
        if bytes.len() != 32 + CHECKSUM_LEN {
            return Err(EtfError::Address {
                address: encoded.to_string(),
                reason: format!("expected 36 decoded bytes, got {}", bytes.len()),
            });
        }

        let (public_key, check) = bytes.split_at(32);
        if checksum(public_key) != check {
            return Err(EtfError::Address {
                address: encoded.to_string(),
                reason: "checksum mismatch".to_string(),
            });
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(public_key);
        Ok(Address(key))
    }

    pub fn encode(&self) -> String {
        let mut bytes = Vec::with_capacity(32 + CHECKSUM_LEN);
        bytes.extend_from_slice(&self.0);
        bytes.extend_from_slice(&checksum(&self.0));
        BASE32_NOPAD.encode(&bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

// On the wire an address is its raw public key bytes.
impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

struct AddressVisitor;

impl<'de> Visitor<'de> for AddressVisitor {
    type Value = Address;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("32 raw public key bytes")
    }

    fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<Address, E> {
        if v.len() != 32 {
            return Err(E::invalid_length(v.len(), &self));
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(v);
        Ok(Address(key))
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        deserializer.deserialize_bytes(AddressVisitor)
    }
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

/// An unsigned transaction. Field declaration order is the sorted key order
/// required by the canonical encoding; zero-value fields are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "aamt", skip_serializing_if = "is_zero", default)]
    pub asset_amount: u64,
    #[serde(rename = "amt", skip_serializing_if = "is_zero", default)]
    pub amount: u64,
    #[serde(rename = "arcv", skip_serializing_if = "Option::is_none", default)]
    pub asset_receiver: Option<Address>,
    #[serde(rename = "fee", skip_serializing_if = "is_zero", default)]
    pub fee: u64,
    #[serde(rename = "fv")]
    pub first_valid: u64,
    #[serde(rename = "gen", skip_serializing_if = "String::is_empty", default)]
    pub genesis_id: String,
    #[serde(rename = "gh", with = "serde_bytes")]
    pub genesis_hash: Vec<u8>,
    #[serde(rename = "lv")]
    pub last_valid: u64,
    #[serde(rename = "rcv", skip_serializing_if = "Option::is_none", default)]
    pub receiver: Option<Address>,
    #[serde(rename = "snd")]
    pub sender: Address,
    #[serde(rename = "type")]
    pub txn_type: String,
    #[serde(rename = "xaid", skip_serializing_if = "is_zero", default)]
    pub asset_id: u64,
}

impl Transaction {
    /// An algo payment (`pay`) moving `microalgos` from sender to receiver.
    pub fn payment(
        params: &NetworkParams,
        sender: Address,
        receiver: Address,
        microalgos: u64,
    ) -> Self {
        Transaction {
            asset_amount: 0,
            amount: microalgos,
            asset_receiver: None,
            fee: params.fee,
            first_valid: params.first_valid,
            genesis_id: params.genesis_id.clone(),
            genesis_hash: params.genesis_hash.clone(),
            last_valid: params.last_valid,
            receiver: Some(receiver),
            sender,
            txn_type: "pay".to_string(),
            asset_id: 0,
        }
    }

    /// An asset transfer (`axfer`) moving `amount` base units of `asset_id`.
    pub fn asset_transfer(
        params: &NetworkParams,
        sender: Address,
        receiver: Address,
        asset_id: u64,
        amount: u64,
    ) -> Self {
        Transaction {
            asset_amount: amount,
            amount: 0,
            asset_receiver: Some(receiver),
            fee: params.fee,
            first_valid: params.first_valid,
            genesis_id: params.genesis_id.clone(),
            genesis_hash: params.genesis_hash.clone(),
            last_valid: params.last_valid,
            receiver: None,
            sender,
            txn_type: "axfer".to_string(),
            asset_id,
        }
    }

    /// Canonical msgpack encoding of the unsigned transaction.
    pub fn encode(&self) -> Result<Vec<u8>, EtfError> {
        rmp_serde::to_vec_named(self).map_err(|e| EtfError::Ledger {
            reason: format!("transaction encoding failed: {e}"),
        })
    }

    fn signable_bytes(&self) -> Result<Vec<u8>, EtfError> {
        let encoded = self.encode()?;
        let mut bytes = Vec::with_capacity(2 + encoded.len());
        bytes.extend_from_slice(b"TX");
        bytes.extend_from_slice(&encoded);
        Ok(bytes)
    }

    /// The transaction id: base32 of SHA-512/256 over the signable bytes.
    pub fn id(&self) -> Result<String, EtfError> {
        let digest = Sha512_256::digest(self.signable_bytes()?);
        Ok(BASE32_NOPAD.encode(&digest))
    }
}

/// Serialize an unsigned leg to an artifact file for out-of-band signing.
pub fn write_unsigned_to_file(txn: &Transaction, path: &Path) -> Result<(), EtfError> {
    let encoded = txn.encode()?;
    std::fs::write(path, encoded).map_err(|e| EtfError::Artifact {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// An ed25519 signing key held as its 32-byte seed.
#[derive(Clone)]
pub struct SigningCredentials {
    seed: [u8; 32],
}

impl SigningCredentials {
    pub fn new(seed: [u8; 32]) -> Self {
        SigningCredentials { seed }
    }

    /// The address controlled by this key.
    pub fn address(&self) -> Address {
        let key = SigningKey::from_bytes(&self.seed);
        Address(key.verifying_key().to_bytes())
    }

    pub fn sign(&self, txn: &Transaction) -> Result<SignedTransaction, EtfError> {
        let key = SigningKey::from_bytes(&self.seed);
        let signature = key.sign(&txn.signable_bytes()?);
        Ok(SignedTransaction {
            sig: signature.to_bytes().to_vec(),
            txn: txn.clone(),
        })
    }
}

impl fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never leak the seed into logs.
        write!(f, "SigningCredentials({})", self.address())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SignedTransaction {
    #[serde(rename = "sig", with = "serde_bytes")]
    pub sig: Vec<u8>,
    #[serde(rename = "txn")]
    pub txn: Transaction,
}

impl SignedTransaction {
    pub fn encode(&self) -> Result<Vec<u8>, EtfError> {
        rmp_serde::to_vec_named(self).map_err(|e| EtfError::Ledger {
            reason: format!("signed transaction encoding failed: {e}"),
        })
    }

    pub fn id(&self) -> Result<String, EtfError> {
        self.txn.id()
    }
}
