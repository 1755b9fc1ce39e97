//! Revision use-case service.
//!
//! # Responsibility
//! - Validate raw identifiers at the boundary, then delegate to the repository.
//! - Turn "not visible" into a semantic not-found error for single reads.
//!
//! # Invariants
//! - No unvalidated identifier reaches the repository.
//! - Service layer remains storage-agnostic.

use crate::model::identifier::{Identifier, IdentifierError, RevisionUuid};
use crate::model::revision::{Revision, RevisionMetadata};
use crate::repo::revision_repo::{AssociationClearScope, RevisionRepository};
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for revision use cases.
#[derive(Debug)]
pub enum RevisionServiceError {
    /// Raw identifier input is malformed.
    InvalidIdentifier(IdentifierError),
    /// Revision does not exist or is not visible to the requester.
    NotFound(RevisionUuid),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for RevisionServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidIdentifier(err) => write!(f, "{err}"),
            Self::NotFound(uuid) => write!(f, "Could not find revision {uuid}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RevisionServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidIdentifier(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<IdentifierError> for RevisionServiceError {
    fn from(value: IdentifierError) -> Self {
        Self::InvalidIdentifier(value)
    }
}

impl From<RepoError> for RevisionServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type RevisionServiceResult<T> = Result<T, RevisionServiceError>;

/// Revision service facade over repository implementations.
pub struct RevisionService<R: RevisionRepository> {
    repo: R,
}

impl<R: RevisionRepository> RevisionService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Stores a revision taken when an item was saved.
    pub fn save_revision(&self, revision: &Revision) -> RevisionServiceResult<()> {
        self.repo.insert(revision)?;
        Ok(())
    }

    /// Loads one revision the requester may see.
    ///
    /// `shared_vault_uuids` is the requester's membership set, supplied by
    /// the caller.
    pub fn get_revision(
        &self,
        user_uuid: &str,
        revision_uuid: &str,
        shared_vault_uuids: &[String],
    ) -> RevisionServiceResult<Revision> {
        let user_uuid = Identifier::create(user_uuid)?;
        let revision_uuid = Identifier::create(revision_uuid)?;
        let shared_vault_uuids = Identifier::create_many(shared_vault_uuids)?;

        self.repo
            .find_one_by_uuid(&revision_uuid, &user_uuid, &shared_vault_uuids)?
            .ok_or(RevisionServiceError::NotFound(revision_uuid))
    }

    /// Lists metadata of the item's visible revisions, most recent first.
    pub fn get_revisions_metadata(
        &self,
        user_uuid: &str,
        item_uuid: &str,
        shared_vault_uuids: &[String],
    ) -> RevisionServiceResult<Vec<RevisionMetadata>> {
        let user_uuid = Identifier::create(user_uuid)?;
        let item_uuid = Identifier::create(item_uuid)?;
        let shared_vault_uuids = Identifier::create_many(shared_vault_uuids)?;

        Ok(self
            .repo
            .find_metadata_by_item_id(&item_uuid, &user_uuid, &shared_vault_uuids)?)
    }

    /// Deletes one owned revision. Deleting a missing revision succeeds.
    pub fn delete_revision(&self, user_uuid: &str, revision_uuid: &str) -> RevisionServiceResult<()> {
        let user_uuid = Identifier::create(user_uuid)?;
        let revision_uuid = Identifier::create(revision_uuid)?;

        self.repo.remove_one_by_uuid(&revision_uuid, &user_uuid)?;
        Ok(())
    }

    /// Deletes every revision a user owns (account deletion).
    pub fn remove_revisions_for_user(&self, user_uuid: &str) -> RevisionServiceResult<usize> {
        let user_uuid = Identifier::create(user_uuid)?;
        let removed = self.repo.remove_by_user_uuid(&user_uuid)?;
        info!(
            "event=revisions_remove_for_user module=service status=ok user={} removed={}",
            user_uuid, removed
        );
        Ok(removed)
    }

    /// Detaches revisions from a vault, optionally narrowed to one item.
    pub fn detach_from_shared_vault(
        &self,
        shared_vault_uuid: &str,
        item_uuid: Option<&str>,
    ) -> RevisionServiceResult<usize> {
        let shared_vault_uuid = Identifier::create(shared_vault_uuid)?;
        let scope = match item_uuid {
            Some(item_uuid) => {
                AssociationClearScope::item(Identifier::create(item_uuid)?, shared_vault_uuid)
            }
            None => AssociationClearScope::vault(shared_vault_uuid),
        };

        Ok(self
            .repo
            .clear_shared_vault_and_key_system_associations(&scope)?)
    }
}
