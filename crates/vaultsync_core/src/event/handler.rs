//! Downstream consumers of domain events.
//!
//! # Responsibility
//! - Detach revisions when a vault or an item leaves shared custody.
//! - Drain the outbox into registered handlers.
//!
//! # Invariants
//! - An event is marked processed only after every handler accepted it.
//! - Dispatch stops at the first failing event so ordering is preserved.

use crate::event::publisher::SqliteDomainEventOutbox;
use crate::event::{DomainEvent, DomainEventPayload};
use crate::repo::revision_repo::{AssociationClearScope, RevisionRepository};
use crate::repo::RepoResult;
use log::{error, info};

const DISPATCH_BATCH_SIZE: u32 = 100;

/// Consumer of domain events.
pub trait DomainEventHandler {
    /// Handles one event. Events the handler does not care about are accepted.
    fn handle(&self, event: &DomainEvent) -> RepoResult<()>;
}

/// Keeps revisions readable as private history once their vault association ends.
pub struct RevisionAssociationHandler<R: RevisionRepository> {
    repo: R,
}

impl<R: RevisionRepository> RevisionAssociationHandler<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }
}

impl<R: RevisionRepository> DomainEventHandler for RevisionAssociationHandler<R> {
    fn handle(&self, event: &DomainEvent) -> RepoResult<()> {
        let scope = match &event.payload {
            DomainEventPayload::SharedVaultRemoved { shared_vault_uuid } => {
                AssociationClearScope::vault(shared_vault_uuid.clone())
            }
            DomainEventPayload::ItemRemovedFromSharedVault {
                shared_vault_uuid,
                item_uuid,
            } => AssociationClearScope::item(item_uuid.clone(), shared_vault_uuid.clone()),
            DomainEventPayload::UserRemovedFromSharedVault { .. } => return Ok(()),
        };

        let detached = self
            .repo
            .clear_shared_vault_and_key_system_associations(&scope)?;
        info!(
            "event=revision_detach module=event status=ok type={} vault={} detached={}",
            event.event_type(),
            scope.shared_vault_uuid,
            detached
        );
        Ok(())
    }
}

/// Hands pending outbox events to `handlers` in order.
///
/// Returns the number of events marked processed.
pub fn dispatch_pending(
    outbox: &SqliteDomainEventOutbox<'_>,
    handlers: &[&dyn DomainEventHandler],
) -> RepoResult<usize> {
    let mut processed = 0;
    loop {
        let batch = outbox.list_pending(DISPATCH_BATCH_SIZE)?;
        if batch.is_empty() {
            return Ok(processed);
        }

        for stored in batch {
            for handler in handlers {
                if let Err(err) = handler.handle(&stored.event) {
                    error!(
                        "event=domain_event_dispatch module=event status=error type={} event_uuid={} error={}",
                        stored.event.event_type(),
                        stored.event.uuid,
                        err
                    );
                    return Err(err);
                }
            }
            if outbox.mark_processed(stored.id)? {
                processed += 1;
            }
        }
    }
}
