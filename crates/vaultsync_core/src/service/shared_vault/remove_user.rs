//! Remove-user-from-shared-vault use case.
//!
//! # Invariants
//! - Only the owner may remove other members; anyone may remove themselves.
//! - The owner's own membership survives unless `force_remove_owner` is set.
//! - A `UserRemovedFromSharedVault` event follows every successful removal.

use crate::event::factory::DomainEventFactory;
use crate::event::publisher::DomainEventPublisher;
use crate::model::identifier::Identifier;
use crate::repo::shared_vault_repo::SharedVaultRepository;
use crate::repo::shared_vault_user_repo::SharedVaultUserRepository;
use crate::service::shared_vault::{
    RemoveSharedVaultUser, RemoveUserFromSharedVaultRequest, SharedVaultError, SharedVaultResult,
};
use log::info;

pub struct RemoveUserFromSharedVault<'a> {
    shared_vaults: &'a dyn SharedVaultRepository,
    shared_vault_users: &'a dyn SharedVaultUserRepository,
    event_factory: &'a DomainEventFactory,
    event_publisher: &'a dyn DomainEventPublisher,
}

impl<'a> RemoveUserFromSharedVault<'a> {
    pub fn new(
        shared_vaults: &'a dyn SharedVaultRepository,
        shared_vault_users: &'a dyn SharedVaultUserRepository,
        event_factory: &'a DomainEventFactory,
        event_publisher: &'a dyn DomainEventPublisher,
    ) -> Self {
        Self {
            shared_vaults,
            shared_vault_users,
            event_factory,
            event_publisher,
        }
    }
}

impl RemoveSharedVaultUser for RemoveUserFromSharedVault<'_> {
    fn execute(&self, request: &RemoveUserFromSharedVaultRequest) -> SharedVaultResult<()> {
        let originator_uuid = Identifier::create(&request.originator_uuid)?;
        let shared_vault_uuid = Identifier::create(&request.shared_vault_uuid)?;
        let user_uuid = Identifier::create(&request.user_uuid)?;

        let shared_vault = self
            .shared_vaults
            .find_by_uuid(&shared_vault_uuid)?
            .ok_or(SharedVaultError::SharedVaultNotFound)?;

        let originator_is_owner = shared_vault.is_owned_by(&originator_uuid);
        if !originator_is_owner && originator_uuid != user_uuid {
            return Err(SharedVaultError::NotAllowedToRemoveUser);
        }

        if shared_vault.is_owned_by(&user_uuid) && !request.force_remove_owner {
            return Err(SharedVaultError::OwnerCannotBeRemoved);
        }

        let membership = self
            .shared_vault_users
            .find_by_user_uuid_and_shared_vault_uuid(&user_uuid, &shared_vault_uuid)?
            .ok_or(SharedVaultError::NotAMember)?;

        self.shared_vault_users.remove(&membership)?;

        self.event_publisher.publish(
            &self
                .event_factory
                .create_user_removed_from_shared_vault_event(&shared_vault_uuid, &user_uuid),
        )?;

        info!(
            "event=shared_vault_user_remove module=service status=ok vault={} user={} forced={}",
            shared_vault_uuid, user_uuid, request.force_remove_owner
        );
        Ok(())
    }
}
