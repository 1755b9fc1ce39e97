//! Decline-invite-to-shared-vault use case.
//!
//! Declining is terminal: the invite row is removed so nothing can resolve
//! against it afterwards.

use crate::model::identifier::Identifier;
use crate::repo::shared_vault_invite_repo::SharedVaultInviteRepository;
use crate::service::shared_vault::{
    DeclineInviteToSharedVaultRequest, DeclineSharedVaultInvite, SharedVaultError,
    SharedVaultResult,
};
use log::info;

pub struct DeclineInviteToSharedVault<'a> {
    shared_vault_invites: &'a dyn SharedVaultInviteRepository,
}

impl<'a> DeclineInviteToSharedVault<'a> {
    pub fn new(shared_vault_invites: &'a dyn SharedVaultInviteRepository) -> Self {
        Self {
            shared_vault_invites,
        }
    }
}

impl DeclineSharedVaultInvite for DeclineInviteToSharedVault<'_> {
    fn execute(&self, request: &DeclineInviteToSharedVaultRequest) -> SharedVaultResult<()> {
        let invite_uuid = Identifier::create(&request.invite_uuid)?;
        let user_uuid = Identifier::create(&request.user_uuid)?;

        let invite = self
            .shared_vault_invites
            .find_by_uuid(&invite_uuid)?
            .ok_or(SharedVaultError::InviteNotFound)?;

        if invite.user_uuid != user_uuid {
            return Err(SharedVaultError::NotInviteRecipient);
        }

        self.shared_vault_invites.remove(&invite)?;

        info!(
            "event=shared_vault_invite_decline module=service status=ok invite={} vault={}",
            invite_uuid, invite.shared_vault_uuid
        );
        Ok(())
    }
}
