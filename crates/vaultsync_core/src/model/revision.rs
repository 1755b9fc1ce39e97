//! Revision domain model.
//!
//! # Responsibility
//! - Define the historical snapshot record and its metadata projection.
//! - Express the ownership-or-membership visibility rule in memory.
//!
//! # Invariants
//! - `user_uuid` is the owner and never changes after creation.
//! - `shared_vault_uuid` and `key_system_identifier` are cleared together.
//! - `updated_at` is never earlier than `created_at`.

use crate::model::identifier::{ItemUuid, RevisionUuid, SharedVaultUuid, UserUuid};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failure for revision records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionValidationError {
    BlankContentType,
    BlankKeySystemIdentifier,
    UpdatedBeforeCreated { created_at: i64, updated_at: i64 },
}

impl Display for RevisionValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankContentType => write!(f, "revision content type must not be blank"),
            Self::BlankKeySystemIdentifier => {
                write!(f, "revision key system identifier must not be blank when set")
            }
            Self::UpdatedBeforeCreated {
                created_at,
                updated_at,
            } => write!(
                f,
                "revision updated_at ({updated_at}) is earlier than created_at ({created_at})"
            ),
        }
    }
}

impl Error for RevisionValidationError {}

/// One historical snapshot of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub uuid: RevisionUuid,
    /// Item this revision snapshots.
    pub item_uuid: ItemUuid,
    /// Owning (creating) user.
    pub user_uuid: UserUuid,
    /// Encrypted item content. Opaque to this crate.
    pub content: Option<String>,
    pub content_type: String,
    pub items_key_id: Option<String>,
    pub enc_item_key: Option<String>,
    pub auth_hash: Option<String>,
    /// Set while the owning item belongs to a shared vault.
    pub shared_vault_uuid: Option<SharedVaultUuid>,
    /// Encryption-scheme reference, meaningful only alongside a shared vault.
    pub key_system_identifier: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl Revision {
    /// Creates a private revision with a generated id and empty payload.
    pub fn new(
        item_uuid: ItemUuid,
        user_uuid: UserUuid,
        content_type: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            uuid: RevisionUuid::generate(),
            item_uuid,
            user_uuid,
            content: None,
            content_type: content_type.into(),
            items_key_id: None,
            enc_item_key: None,
            auth_hash: None,
            shared_vault_uuid: None,
            key_system_identifier: None,
            created_at,
            updated_at: created_at,
        }
    }

    /// Checks record-level invariants before persistence.
    pub fn validate(&self) -> Result<(), RevisionValidationError> {
        if self.content_type.trim().is_empty() {
            return Err(RevisionValidationError::BlankContentType);
        }
        if let Some(identifier) = self.key_system_identifier.as_deref() {
            if identifier.trim().is_empty() {
                return Err(RevisionValidationError::BlankKeySystemIdentifier);
            }
        }
        if self.updated_at < self.created_at {
            return Err(RevisionValidationError::UpdatedBeforeCreated {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }

    /// Returns whether `user_uuid` may read this revision given its vault memberships.
    ///
    /// Mirrors the SQL predicate used by the repository.
    pub fn is_visible_to(&self, user_uuid: &UserUuid, shared_vault_uuids: &[SharedVaultUuid]) -> bool {
        if &self.user_uuid == user_uuid {
            return true;
        }
        match self.shared_vault_uuid.as_ref() {
            Some(vault) => shared_vault_uuids.contains(vault),
            None => false,
        }
    }

    /// Drops the shared vault association, keeping the revision as private history.
    pub fn detach_from_shared_vault(&mut self) {
        self.shared_vault_uuid = None;
        self.key_system_identifier = None;
    }

    pub fn metadata(&self) -> RevisionMetadata {
        RevisionMetadata {
            uuid: self.uuid.clone(),
            item_uuid: self.item_uuid.clone(),
            content_type: self.content_type.clone(),
            shared_vault_uuid: self.shared_vault_uuid.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Payload-free projection used by revision listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionMetadata {
    pub uuid: RevisionUuid,
    pub item_uuid: ItemUuid,
    pub content_type: String,
    pub shared_vault_uuid: Option<SharedVaultUuid>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::{Revision, RevisionValidationError};
    use crate::model::identifier::Identifier;

    fn sample() -> Revision {
        Revision::new(Identifier::generate(), Identifier::generate(), "Note", 1_000)
    }

    #[test]
    fn validate_rejects_blank_content_type() {
        let mut revision = sample();
        revision.content_type = "  ".to_string();
        assert_eq!(
            revision.validate(),
            Err(RevisionValidationError::BlankContentType)
        );
    }

    #[test]
    fn validate_rejects_time_travel() {
        let mut revision = sample();
        revision.updated_at = 999;
        assert!(matches!(
            revision.validate(),
            Err(RevisionValidationError::UpdatedBeforeCreated { .. })
        ));
    }

    #[test]
    fn visibility_follows_owner_or_membership() {
        let vault = Identifier::generate();
        let stranger = Identifier::generate();
        let mut revision = sample();
        revision.shared_vault_uuid = Some(vault.clone());

        assert!(revision.is_visible_to(&revision.user_uuid.clone(), &[]));
        assert!(revision.is_visible_to(&stranger, &[vault.clone()]));
        assert!(!revision.is_visible_to(&stranger, &[]));

        revision.detach_from_shared_vault();
        assert!(!revision.is_visible_to(&stranger, &[vault]));
        assert_eq!(revision.key_system_identifier, None);
    }
}
