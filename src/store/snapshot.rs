use super::MemoryStore;
use crate::document::ProcurementDocument;
use crate::error::StoreError;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};

/// A serializable image of a `MemoryStore`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StoreSnapshot {
    pub documents: Vec<ProcurementDocument>,
}

impl StoreSnapshot {
    pub fn capture(store: &MemoryStore) -> Result<Self, StoreError> {
        Ok(Self {
            documents: store.documents()?,
        })
    }

    pub fn restore(self) -> MemoryStore {
        MemoryStore::with_documents(self.documents)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        encode_to_vec(self, standard())
            .map_err(|e| StoreError::Backend(format!("Serialization failed: {}", e)))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        decode_from_slice(bytes, standard())
            .map(|(snapshot, _)| snapshot)
            .map_err(|e| StoreError::Backend(format!("Deserialization failed: {}", e)))
    }

    /// Saves the snapshot to a file using the bincode format.
    pub fn save(&self, path: &str) -> Result<(), StoreError> {
        let bytes = self.to_bytes()?;
        let mut file = fs::File::create(path).map_err(|e| {
            StoreError::Backend(format!("Could not create file '{}': {}", path, e))
        })?;
        file.write_all(&bytes).map_err(|e| {
            StoreError::Backend(format!("Could not write to file '{}': {}", path, e))
        })?;
        Ok(())
    }

    pub fn from_file(path: &str) -> Result<Self, StoreError> {
        let mut file = fs::File::open(path)
            .map_err(|e| StoreError::Backend(format!("Could not open file '{}': {}", path, e)))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| {
            StoreError::Backend(format!("Could not read from file '{}': {}", path, e))
        })?;
        Self::from_bytes(&bytes)
    }
}
