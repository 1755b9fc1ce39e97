//! Domain event construction.

use crate::event::{DomainEvent, DomainEventPayload};
use crate::model::identifier::{Identifier, ItemUuid, SharedVaultUuid, UserUuid};
use std::time::{SystemTime, UNIX_EPOCH};

/// Origin stamped on events when none is configured.
pub const DEFAULT_EVENT_ORIGIN: &str = "syncing-server";

/// Builds event envelopes with a fresh id, timestamp and origin.
#[derive(Debug, Clone)]
pub struct DomainEventFactory {
    origin: String,
}

impl Default for DomainEventFactory {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_ORIGIN)
    }
}

impl DomainEventFactory {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
        }
    }

    pub fn create_shared_vault_removed_event(
        &self,
        shared_vault_uuid: &SharedVaultUuid,
    ) -> DomainEvent {
        self.envelope(DomainEventPayload::SharedVaultRemoved {
            shared_vault_uuid: shared_vault_uuid.clone(),
        })
    }

    pub fn create_user_removed_from_shared_vault_event(
        &self,
        shared_vault_uuid: &SharedVaultUuid,
        user_uuid: &UserUuid,
    ) -> DomainEvent {
        self.envelope(DomainEventPayload::UserRemovedFromSharedVault {
            shared_vault_uuid: shared_vault_uuid.clone(),
            user_uuid: user_uuid.clone(),
        })
    }

    pub fn create_item_removed_from_shared_vault_event(
        &self,
        shared_vault_uuid: &SharedVaultUuid,
        item_uuid: &ItemUuid,
    ) -> DomainEvent {
        self.envelope(DomainEventPayload::ItemRemovedFromSharedVault {
            shared_vault_uuid: shared_vault_uuid.clone(),
            item_uuid: item_uuid.clone(),
        })
    }

    fn envelope(&self, payload: DomainEventPayload) -> DomainEvent {
        DomainEvent {
            uuid: Identifier::generate(),
            created_at: now_epoch_ms(),
            origin: self.origin.clone(),
            payload,
        }
    }
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
