//! # In-Memory NFT Collections
//!
//! A mintable token registry that plays the [`OwnershipOracle`] role for
//! local deployments, demos, and tests. Collections are created implicitly
//! on first mint; token ids are assigned sequentially per collection,
//! starting at zero, the way a minimal NFT contract's token counter works.
//!
//! Approvals are per-token and owner-gated: only the current owner can
//! authorize the marketplace to move a token, and any transfer clears the
//! token's approval — the new owner must opt in again.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::oracle::{OracleError, OwnershipOracle};
use crate::types::ItemKey;

/// Mintable in-memory collections with per-token marketplace approvals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NftRegistry {
    /// Current owner of each minted token.
    #[serde(with = "crate::types::item_key_map")]
    owners: HashMap<ItemKey, String>,
    /// Next token id per collection.
    next_id: HashMap<String, u64>,
    /// Tokens whose owner has authorized the marketplace to transfer them.
    approvals: HashSet<String>,
}

impl NftRegistry {
    /// Creates an empty registry with no collections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints the next token in `collection` to `owner` and returns its id.
    ///
    /// The collection springs into existence on its first mint. Freshly
    /// minted tokens carry no marketplace approval.
    pub fn mint(&mut self, collection: &str, owner: &str) -> u64 {
        let next = self.next_id.entry(collection.to_string()).or_insert(0);
        let token_id = *next;
        *next += 1;

        self.owners
            .insert(ItemKey::new(collection, token_id), owner.to_string());
        token_id
    }

    /// Grants or revokes the marketplace's authorization to transfer the
    /// token. Only the current owner may change it.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::UnknownToken`] for unminted tokens and
    /// [`OracleError::NotTokenOwner`] if `caller` does not own the token.
    pub fn set_approval(
        &mut self,
        key: &ItemKey,
        caller: &str,
        approved: bool,
    ) -> Result<(), OracleError> {
        let owner = self
            .owners
            .get(key)
            .ok_or_else(|| OracleError::UnknownToken { key: key.clone() })?;

        if owner != caller {
            return Err(OracleError::NotTokenOwner {
                key: key.clone(),
                from: caller.to_string(),
            });
        }

        if approved {
            self.approvals.insert(key.to_string());
        } else {
            self.approvals.remove(&key.to_string());
        }
        Ok(())
    }

    /// Returns the number of minted tokens across all collections.
    pub fn token_count(&self) -> usize {
        self.owners.len()
    }
}

impl OwnershipOracle for NftRegistry {
    fn owner_of(&self, key: &ItemKey) -> Option<String> {
        self.owners.get(key).cloned()
    }

    fn is_approved_for_marketplace(&self, key: &ItemKey) -> bool {
        self.approvals.contains(&key.to_string())
    }

    fn transfer(&mut self, key: &ItemKey, from: &str, to: &str) -> Result<(), OracleError> {
        let owner = self
            .owners
            .get_mut(key)
            .ok_or_else(|| OracleError::UnknownToken { key: key.clone() })?;

        if owner != from {
            return Err(OracleError::NotTokenOwner {
                key: key.clone(),
                from: from.to_string(),
            });
        }

        *owner = to.to_string();
        // Approval does not survive an ownership change.
        self.approvals.remove(&key.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_assigns_sequential_ids_per_collection() {
        let mut nfts = NftRegistry::new();
        assert_eq!(nfts.mint("origins", "alice"), 0);
        assert_eq!(nfts.mint("origins", "alice"), 1);
        assert_eq!(nfts.mint("meridian", "bob"), 0);
        assert_eq!(nfts.token_count(), 3);
    }

    #[test]
    fn owner_of_minted_token() {
        let mut nfts = NftRegistry::new();
        let id = nfts.mint("origins", "alice");
        assert_eq!(
            nfts.owner_of(&ItemKey::new("origins", id)),
            Some("alice".to_string())
        );
    }

    #[test]
    fn owner_of_unminted_token_is_none() {
        let nfts = NftRegistry::new();
        assert!(nfts.owner_of(&ItemKey::new("origins", 0)).is_none());
    }

    #[test]
    fn approval_gated_to_owner() {
        let mut nfts = NftRegistry::new();
        let id = nfts.mint("origins", "alice");
        let key = ItemKey::new("origins", id);

        let result = nfts.set_approval(&key, "mallory", true);
        assert!(matches!(
            result.unwrap_err(),
            OracleError::NotTokenOwner { .. }
        ));
        assert!(!nfts.is_approved_for_marketplace(&key));

        nfts.set_approval(&key, "alice", true).unwrap();
        assert!(nfts.is_approved_for_marketplace(&key));
    }

    #[test]
    fn approval_can_be_revoked() {
        let mut nfts = NftRegistry::new();
        let id = nfts.mint("origins", "alice");
        let key = ItemKey::new("origins", id);

        nfts.set_approval(&key, "alice", true).unwrap();
        nfts.set_approval(&key, "alice", false).unwrap();
        assert!(!nfts.is_approved_for_marketplace(&key));
    }

    #[test]
    fn transfer_moves_ownership_and_clears_approval() {
        let mut nfts = NftRegistry::new();
        let id = nfts.mint("origins", "alice");
        let key = ItemKey::new("origins", id);
        nfts.set_approval(&key, "alice", true).unwrap();

        nfts.transfer(&key, "alice", "bob").unwrap();

        assert_eq!(nfts.owner_of(&key), Some("bob".to_string()));
        assert!(!nfts.is_approved_for_marketplace(&key));
    }

    #[test]
    fn transfer_from_non_owner_rejected() {
        let mut nfts = NftRegistry::new();
        let id = nfts.mint("origins", "alice");
        let key = ItemKey::new("origins", id);

        let result = nfts.transfer(&key, "mallory", "bob");
        assert!(matches!(
            result.unwrap_err(),
            OracleError::NotTokenOwner { .. }
        ));
        assert_eq!(nfts.owner_of(&key), Some("alice".to_string()));
    }

    #[test]
    fn transfer_unknown_token_rejected() {
        let mut nfts = NftRegistry::new();
        let result = nfts.transfer(&ItemKey::new("origins", 5), "alice", "bob");
        assert!(matches!(
            result.unwrap_err(),
            OracleError::UnknownToken { .. }
        ));
    }

    #[test]
    fn registry_serialization_roundtrip() {
        let mut nfts = NftRegistry::new();
        let id = nfts.mint("origins", "alice");
        let key = ItemKey::new("origins", id);
        nfts.set_approval(&key, "alice", true).unwrap();

        let json = serde_json::to_string(&nfts).unwrap();
        let restored: NftRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.owner_of(&key), Some("alice".to_string()));
        assert!(restored.is_approved_for_marketplace(&key));
    }
}
