//! Data-custody core for revision history and shared vault membership.
//! This crate is the single source of truth for access scoping and
//! vault teardown rules.

pub mod config;
pub mod db;
pub mod event;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{open_core, ConfigError, CoreConfig};
pub use event::factory::DomainEventFactory;
pub use event::handler::{dispatch_pending, DomainEventHandler, RevisionAssociationHandler};
pub use event::publisher::{DomainEventPublisher, SqliteDomainEventOutbox, StoredDomainEvent};
pub use event::{DomainEvent, DomainEventPayload};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::identifier::{
    Identifier, IdentifierError, InviteUuid, ItemUuid, RevisionUuid, SharedVaultUuid, UserUuid,
};
pub use model::revision::{Revision, RevisionMetadata, RevisionValidationError};
pub use model::shared_vault::{
    SharedVault, SharedVaultInvite, SharedVaultUser, SharedVaultUserPermission,
};
pub use repo::revision_repo::{AssociationClearScope, RevisionRepository, SqliteRevisionRepository};
pub use repo::shared_vault_invite_repo::{
    SharedVaultInviteRepository, SqliteSharedVaultInviteRepository,
};
pub use repo::shared_vault_repo::{SharedVaultRepository, SqliteSharedVaultRepository};
pub use repo::shared_vault_user_repo::{
    SharedVaultUserRepository, SqliteSharedVaultUserRepository,
};
pub use repo::{RepoError, RepoResult};
pub use service::revision_service::{RevisionService, RevisionServiceError};
pub use service::shared_vault::{
    DeclineInviteToSharedVault, DeclineInviteToSharedVaultRequest, DeclineSharedVaultInvite,
    DeleteSharedVault, DeleteSharedVaultRequest, DeletionProgress, RemoveSharedVaultUser,
    RemoveUserFromSharedVault, RemoveUserFromSharedVaultRequest, SharedVaultError,
    SharedVaultErrorKind, SharedVaultResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
