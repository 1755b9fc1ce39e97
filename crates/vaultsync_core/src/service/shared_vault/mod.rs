//! Shared vault membership, invite and teardown use cases.
//!
//! # Responsibility
//! - Own every cross-record rule for vaults, members and invites.
//! - Report expected failures as `SharedVaultError` values.
//!
//! # Invariants
//! - Raw identifiers are validated before any storage access.
//! - Messages of sub-use-case failures reach the caller verbatim.

use crate::model::identifier::{IdentifierError, InviteUuid, UserUuid};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod decline_invite;
pub mod delete_shared_vault;
pub mod remove_user;

pub use decline_invite::DeclineInviteToSharedVault;
pub use delete_shared_vault::{DeleteSharedVault, DeleteSharedVaultRequest, DeletionProgress};
pub use remove_user::RemoveUserFromSharedVault;

pub type SharedVaultResult<T> = Result<T, SharedVaultError>;

/// Coarse classification callers use to decide between fixing input,
/// giving up and retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedVaultErrorKind {
    /// Malformed input. Fix and retry.
    Validation,
    /// Referenced record does not exist. Terminal.
    NotFound,
    /// Originator lacks the right. Terminal.
    Authorization,
    /// Teardown stopped part way. Re-running the whole saga converges.
    CascadeStep,
    /// Caller deadline hit between steps; completed steps stay committed.
    Interrupted,
    /// Storage failure outside the declared contract.
    Persistence,
}

/// Failure of a shared vault use case.
#[derive(Debug)]
pub enum SharedVaultError {
    InvalidIdentifier(IdentifierError),
    SharedVaultNotFound,
    /// Originator is not the vault owner.
    NotVaultOwner,
    /// Originator may only remove themselves unless they own the vault.
    NotAllowedToRemoveUser,
    OwnerCannotBeRemoved,
    NotAMember,
    InviteNotFound,
    NotInviteRecipient,
    /// Saga step 4 failed for one member.
    MemberRemovalFailed {
        user_uuid: UserUuid,
        source: Box<SharedVaultError>,
    },
    /// Saga step 5 failed for one invite.
    InviteDeclineFailed {
        invite_uuid: InviteUuid,
        source: Box<SharedVaultError>,
    },
    /// Members or invites appeared after enumeration; the vault was kept.
    VaultRepopulated { members: usize, invites: usize },
    DeadlineExceeded(delete_shared_vault::DeletionProgress),
    Repo(RepoError),
}

impl SharedVaultError {
    pub fn kind(&self) -> SharedVaultErrorKind {
        match self {
            Self::InvalidIdentifier(_) => SharedVaultErrorKind::Validation,
            Self::SharedVaultNotFound | Self::NotAMember | Self::InviteNotFound => {
                SharedVaultErrorKind::NotFound
            }
            Self::NotVaultOwner
            | Self::NotAllowedToRemoveUser
            | Self::OwnerCannotBeRemoved
            | Self::NotInviteRecipient => SharedVaultErrorKind::Authorization,
            Self::MemberRemovalFailed { .. }
            | Self::InviteDeclineFailed { .. }
            | Self::VaultRepopulated { .. } => SharedVaultErrorKind::CascadeStep,
            Self::DeadlineExceeded(_) => SharedVaultErrorKind::Interrupted,
            Self::Repo(_) => SharedVaultErrorKind::Persistence,
        }
    }

    /// Stable code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier(_) => "invalid_identifier",
            Self::SharedVaultNotFound => "shared_vault_not_found",
            Self::NotVaultOwner => "not_vault_owner",
            Self::NotAllowedToRemoveUser => "not_allowed_to_remove_user",
            Self::OwnerCannotBeRemoved => "owner_cannot_be_removed",
            Self::NotAMember => "not_a_member",
            Self::InviteNotFound => "invite_not_found",
            Self::NotInviteRecipient => "not_invite_recipient",
            Self::MemberRemovalFailed { .. } => "member_removal_failed",
            Self::InviteDeclineFailed { .. } => "invite_decline_failed",
            Self::VaultRepopulated { .. } => "vault_repopulated",
            Self::DeadlineExceeded(_) => "deadline_exceeded",
            Self::Repo(_) => "persistence_failed",
        }
    }
}

impl Display for SharedVaultError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidIdentifier(err) => write!(f, "{err}"),
            Self::SharedVaultNotFound => write!(f, "Shared vault not found"),
            Self::NotVaultOwner => write!(f, "Shared vault does not belong to the user"),
            Self::NotAllowedToRemoveUser => {
                write!(f, "Only owner can remove users from shared vault")
            }
            Self::OwnerCannotBeRemoved => write!(f, "Owner cannot be removed from shared vault"),
            Self::NotAMember => write!(f, "User is not a member of the shared vault"),
            Self::InviteNotFound => write!(f, "Invite not found"),
            Self::NotInviteRecipient => {
                write!(f, "Only the recipient of an invite can decline it")
            }
            Self::MemberRemovalFailed { source, .. } => write!(f, "{source}"),
            Self::InviteDeclineFailed { source, .. } => write!(f, "{source}"),
            Self::VaultRepopulated { members, invites } => write!(
                f,
                "Shared vault gained {members} members and {invites} invites during deletion"
            ),
            Self::DeadlineExceeded(progress) => write!(
                f,
                "Shared vault deletion deadline exceeded after removing {} members and declining {} invites",
                progress.members_removed, progress.invites_declined
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SharedVaultError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidIdentifier(err) => Some(err),
            Self::MemberRemovalFailed { source, .. } => Some(source.as_ref()),
            Self::InviteDeclineFailed { source, .. } => Some(source.as_ref()),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<IdentifierError> for SharedVaultError {
    fn from(value: IdentifierError) -> Self {
        Self::InvalidIdentifier(value)
    }
}

impl From<RepoError> for SharedVaultError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Input of the member removal use case. Identifiers are raw strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveUserFromSharedVaultRequest {
    pub originator_uuid: String,
    pub shared_vault_uuid: String,
    pub user_uuid: String,
    /// Lets vault teardown remove the owner's own membership.
    pub force_remove_owner: bool,
}

/// Input of the invite decline use case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclineInviteToSharedVaultRequest {
    pub invite_uuid: String,
    pub user_uuid: String,
}

/// Revokes one member's access to a vault.
pub trait RemoveSharedVaultUser {
    fn execute(&self, request: &RemoveUserFromSharedVaultRequest) -> SharedVaultResult<()>;
}

/// Resolves one pending invite as declined.
pub trait DeclineSharedVaultInvite {
    fn execute(&self, request: &DeclineInviteToSharedVaultRequest) -> SharedVaultResult<()>;
}
