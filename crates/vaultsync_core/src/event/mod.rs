//! Domain events emitted by custody use cases.
//!
//! # Responsibility
//! - Define the event envelope and the payloads this core produces.
//! - Provide the factory, durable publisher and downstream handlers.
//!
//! # Invariants
//! - Payload JSON is adjacently tagged: `{"type": "...", "payload": {...}}`.
//! - An event is constructed only through `DomainEventFactory`.

use crate::model::identifier::{Identifier, ItemUuid, SharedVaultUuid, UserUuid};
use serde::{Deserialize, Serialize};

pub mod factory;
pub mod handler;
pub mod publisher;

/// Event-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainEventPayload {
    /// A shared vault and all of its memberships and invites are gone.
    #[serde(rename_all = "camelCase")]
    SharedVaultRemoved { shared_vault_uuid: SharedVaultUuid },
    /// One member lost access to a shared vault.
    #[serde(rename_all = "camelCase")]
    UserRemovedFromSharedVault {
        shared_vault_uuid: SharedVaultUuid,
        user_uuid: UserUuid,
    },
    /// One item left a shared vault; its revisions become private history.
    #[serde(rename_all = "camelCase")]
    ItemRemovedFromSharedVault {
        shared_vault_uuid: SharedVaultUuid,
        item_uuid: ItemUuid,
    },
}

impl DomainEventPayload {
    /// Stable type tag, identical to the serialized `type` field.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SharedVaultRemoved { .. } => "SHARED_VAULT_REMOVED",
            Self::UserRemovedFromSharedVault { .. } => "USER_REMOVED_FROM_SHARED_VAULT",
            Self::ItemRemovedFromSharedVault { .. } => "ITEM_REMOVED_FROM_SHARED_VAULT",
        }
    }
}

/// Event envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainEvent {
    pub uuid: Identifier,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Name of the service that produced the event.
    pub origin: String,
    pub payload: DomainEventPayload,
}

impl DomainEvent {
    pub fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }
}

#[cfg(test)]
mod tests {
    use super::DomainEventPayload;
    use crate::model::identifier::Identifier;

    #[test]
    fn shared_vault_removed_payload_uses_camel_case_fields() {
        let vault = Identifier::generate();
        let payload = DomainEventPayload::SharedVaultRemoved {
            shared_vault_uuid: vault.clone(),
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["type"], "SHARED_VAULT_REMOVED");
        assert_eq!(value["payload"]["sharedVaultUuid"], vault.as_str());
        assert_eq!(payload.event_type(), "SHARED_VAULT_REMOVED");
    }

    #[test]
    fn event_type_matches_serialized_tag_for_every_variant() {
        let vault = Identifier::generate();
        let other = Identifier::generate();
        let payloads = [
            DomainEventPayload::UserRemovedFromSharedVault {
                shared_vault_uuid: vault.clone(),
                user_uuid: other.clone(),
            },
            DomainEventPayload::ItemRemovedFromSharedVault {
                shared_vault_uuid: vault,
                item_uuid: other,
            },
        ];

        for payload in payloads {
            let value = serde_json::to_value(&payload).unwrap();
            assert_eq!(value["type"], payload.event_type());
        }
    }
}
