//! Shared vault, membership and invite records.
//!
//! # Invariants
//! - A vault has exactly one owner (`SharedVault::user_uuid`).
//! - Records carry no cross-record rules; use cases enforce them.

use crate::model::identifier::{Identifier, InviteUuid, SharedVaultUuid, UserUuid};
use serde::{Deserialize, Serialize};

/// Collaboration container owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedVault {
    pub uuid: SharedVaultUuid,
    /// Owner, the only user allowed to delete the vault.
    pub user_uuid: UserUuid,
    pub file_upload_bytes_used: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl SharedVault {
    pub fn new(user_uuid: UserUuid, created_at: i64) -> Self {
        Self {
            uuid: Identifier::generate(),
            user_uuid,
            file_upload_bytes_used: 0,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn is_owned_by(&self, user_uuid: &UserUuid) -> bool {
        &self.user_uuid == user_uuid
    }
}

/// Access level carried by a membership or an invite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharedVaultUserPermission {
    Read,
    Write,
    Admin,
}

impl SharedVaultUserPermission {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Admin => "admin",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "read" => Some(Self::Read),
            "write" => Some(Self::Write),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// One user's access grant to one vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedVaultUser {
    pub uuid: Identifier,
    pub shared_vault_uuid: SharedVaultUuid,
    pub user_uuid: UserUuid,
    pub permission: SharedVaultUserPermission,
    pub created_at: i64,
    pub updated_at: i64,
}

impl SharedVaultUser {
    pub fn new(
        shared_vault_uuid: SharedVaultUuid,
        user_uuid: UserUuid,
        permission: SharedVaultUserPermission,
        created_at: i64,
    ) -> Self {
        Self {
            uuid: Identifier::generate(),
            shared_vault_uuid,
            user_uuid,
            permission,
            created_at,
            updated_at: created_at,
        }
    }
}

/// Pending, not yet accepted membership offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedVaultInvite {
    pub uuid: InviteUuid,
    pub shared_vault_uuid: SharedVaultUuid,
    /// Invitee.
    pub user_uuid: UserUuid,
    pub sender_uuid: UserUuid,
    /// Opaque, client-encrypted message for the invitee.
    pub encrypted_message: String,
    pub permission: SharedVaultUserPermission,
    pub created_at: i64,
    pub updated_at: i64,
}

impl SharedVaultInvite {
    pub fn new(
        shared_vault_uuid: SharedVaultUuid,
        user_uuid: UserUuid,
        sender_uuid: UserUuid,
        permission: SharedVaultUserPermission,
        created_at: i64,
    ) -> Self {
        Self {
            uuid: Identifier::generate(),
            shared_vault_uuid,
            user_uuid,
            sender_uuid,
            encrypted_message: String::new(),
            permission,
            created_at,
            updated_at: created_at,
        }
    }
}
