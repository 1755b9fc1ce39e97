//! Delete-shared-vault saga.
//!
//! # Responsibility
//! - Tear a vault down: members, then invites, then the vault row, then the
//!   `SharedVaultRemoved` event.
//!
//! # Invariants
//! - Steps run one at a time and each commits on its own.
//! - The first failing step ends the saga; completed steps are not undone.
//! - Nothing is mutated before ownership is confirmed.
//! - Vault removal and the `SharedVaultRemoved` event commit together: if
//!   publication fails the vault row is restored, so a re-run still finds it.
//!   No deadline check sits between the two.
//! - Re-running after a partial failure converges on the shrunk member and
//!   invite sets.

use crate::event::factory::DomainEventFactory;
use crate::event::publisher::DomainEventPublisher;
use crate::model::identifier::Identifier;
use crate::model::shared_vault::{SharedVault, SharedVaultUser};
use crate::repo::shared_vault_invite_repo::SharedVaultInviteRepository;
use crate::repo::shared_vault_repo::SharedVaultRepository;
use crate::repo::shared_vault_user_repo::SharedVaultUserRepository;
use crate::service::shared_vault::{
    DeclineInviteToSharedVaultRequest, DeclineSharedVaultInvite, RemoveSharedVaultUser,
    RemoveUserFromSharedVaultRequest, SharedVaultError, SharedVaultResult,
};
use log::{debug, error, info, warn};
use std::time::Instant;

/// Input of the deletion saga. Identifiers are raw strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteSharedVaultRequest {
    pub originator_uuid: String,
    pub shared_vault_uuid: String,
}

/// Work already committed when the saga stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletionProgress {
    pub members_removed: usize,
    pub invites_declined: usize,
}

/// Orchestrates vault teardown over independently committed steps.
pub struct DeleteSharedVault<'a> {
    shared_vaults: &'a dyn SharedVaultRepository,
    shared_vault_users: &'a dyn SharedVaultUserRepository,
    shared_vault_invites: &'a dyn SharedVaultInviteRepository,
    remove_user: &'a dyn RemoveSharedVaultUser,
    decline_invite: &'a dyn DeclineSharedVaultInvite,
    event_factory: &'a DomainEventFactory,
    event_publisher: &'a dyn DomainEventPublisher,
}

impl<'a> DeleteSharedVault<'a> {
    pub fn new(
        shared_vaults: &'a dyn SharedVaultRepository,
        shared_vault_users: &'a dyn SharedVaultUserRepository,
        shared_vault_invites: &'a dyn SharedVaultInviteRepository,
        remove_user: &'a dyn RemoveSharedVaultUser,
        decline_invite: &'a dyn DeclineSharedVaultInvite,
        event_factory: &'a DomainEventFactory,
        event_publisher: &'a dyn DomainEventPublisher,
    ) -> Self {
        Self {
            shared_vaults,
            shared_vault_users,
            shared_vault_invites,
            remove_user,
            decline_invite,
            event_factory,
            event_publisher,
        }
    }

    /// Runs the saga to completion or to its first failure.
    pub fn execute(&self, request: &DeleteSharedVaultRequest) -> SharedVaultResult<()> {
        self.run(request, None)
    }

    /// Runs the saga, stopping between steps once `deadline` has passed.
    pub fn execute_before(
        &self,
        request: &DeleteSharedVaultRequest,
        deadline: Instant,
    ) -> SharedVaultResult<()> {
        self.run(request, Some(deadline))
    }

    fn run(
        &self,
        request: &DeleteSharedVaultRequest,
        deadline: Option<Instant>,
    ) -> SharedVaultResult<()> {
        let started_at = Instant::now();
        let mut progress = DeletionProgress::default();

        match self.run_steps(request, deadline, &mut progress) {
            Ok(()) => {
                info!(
                    "event=shared_vault_delete module=service status=ok vault={} members_removed={} invites_declined={} duration_ms={}",
                    request.shared_vault_uuid,
                    progress.members_removed,
                    progress.invites_declined,
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=shared_vault_delete module=service status=error vault={} members_removed={} invites_declined={} duration_ms={} error_code={} error={}",
                    request.shared_vault_uuid,
                    progress.members_removed,
                    progress.invites_declined,
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                Err(err)
            }
        }
    }

    fn run_steps(
        &self,
        request: &DeleteSharedVaultRequest,
        deadline: Option<Instant>,
        progress: &mut DeletionProgress,
    ) -> SharedVaultResult<()> {
        let originator_uuid = Identifier::create(&request.originator_uuid)?;
        let shared_vault_uuid = Identifier::create(&request.shared_vault_uuid)?;
        info!(
            "event=shared_vault_delete module=service status=start vault={} originator={}",
            shared_vault_uuid, originator_uuid
        );

        let shared_vault = self
            .shared_vaults
            .find_by_uuid(&shared_vault_uuid)?
            .ok_or(SharedVaultError::SharedVaultNotFound)?;

        if !shared_vault.is_owned_by(&originator_uuid) {
            return Err(SharedVaultError::NotVaultOwner);
        }

        let members = owner_last(
            &shared_vault,
            self.shared_vault_users
                .find_by_shared_vault_uuid(&shared_vault_uuid)?,
        );
        for member in members {
            ensure_before_deadline(deadline, progress)?;
            debug!(
                "event=shared_vault_delete module=service status=step step=remove_member vault={} user={}",
                shared_vault_uuid, member.user_uuid
            );
            self.remove_user
                .execute(&RemoveUserFromSharedVaultRequest {
                    originator_uuid: originator_uuid.to_string(),
                    shared_vault_uuid: shared_vault_uuid.to_string(),
                    user_uuid: member.user_uuid.to_string(),
                    force_remove_owner: true,
                })
                .map_err(|err| SharedVaultError::MemberRemovalFailed {
                    user_uuid: member.user_uuid.clone(),
                    source: Box::new(err),
                })?;
            progress.members_removed += 1;
        }

        let invites = self
            .shared_vault_invites
            .find_by_shared_vault_uuid(&shared_vault_uuid)?;
        for invite in invites {
            ensure_before_deadline(deadline, progress)?;
            debug!(
                "event=shared_vault_delete module=service status=step step=decline_invite vault={} invite={}",
                shared_vault_uuid, invite.uuid
            );
            self.decline_invite
                .execute(&DeclineInviteToSharedVaultRequest {
                    invite_uuid: invite.uuid.to_string(),
                    user_uuid: invite.user_uuid.to_string(),
                })
                .map_err(|err| SharedVaultError::InviteDeclineFailed {
                    invite_uuid: invite.uuid.clone(),
                    source: Box::new(err),
                })?;
            progress.invites_declined += 1;
        }

        ensure_before_deadline(deadline, progress)?;
        self.ensure_no_dependents_left(&shared_vault)?;

        let removed_event = self
            .event_factory
            .create_shared_vault_removed_event(&shared_vault_uuid);
        self.shared_vaults.remove_with(&shared_vault, &|| {
            self.event_publisher.publish(&removed_event)
        })?;

        Ok(())
    }

    /// Re-reads members and invites right before the vault row goes away.
    ///
    /// Anything added after enumeration keeps the vault alive; the caller
    /// re-runs the saga to sweep it.
    fn ensure_no_dependents_left(&self, shared_vault: &SharedVault) -> SharedVaultResult<()> {
        let members = self
            .shared_vault_users
            .find_by_shared_vault_uuid(&shared_vault.uuid)?
            .len();
        let invites = self
            .shared_vault_invites
            .find_by_shared_vault_uuid(&shared_vault.uuid)?
            .len();

        if members > 0 || invites > 0 {
            warn!(
                "event=shared_vault_delete module=service status=conflict vault={} late_members={} late_invites={}",
                shared_vault.uuid, members, invites
            );
            return Err(SharedVaultError::VaultRepopulated { members, invites });
        }
        Ok(())
    }
}

/// Moves the owner's membership to the end, keeping storage order otherwise.
fn owner_last(shared_vault: &SharedVault, mut members: Vec<SharedVaultUser>) -> Vec<SharedVaultUser> {
    members.sort_by_key(|member| shared_vault.is_owned_by(&member.user_uuid));
    members
}

fn ensure_before_deadline(
    deadline: Option<Instant>,
    progress: &DeletionProgress,
) -> SharedVaultResult<()> {
    match deadline {
        Some(deadline) if Instant::now() >= deadline => {
            Err(SharedVaultError::DeadlineExceeded(*progress))
        }
        _ => Ok(()),
    }
}
