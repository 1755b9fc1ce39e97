mod common;

use common::{insert_revision, new_id, setup};
use std::cell::Cell;
use vaultsync_core::{
    dispatch_pending, DomainEvent, DomainEventFactory, DomainEventHandler, DomainEventPayload,
    DomainEventPublisher, RepoError, RepoResult, RevisionAssociationHandler, RevisionRepository,
    SqliteDomainEventOutbox, SqliteRevisionRepository,
};

struct CountingHandler {
    seen: Cell<usize>,
}

impl DomainEventHandler for CountingHandler {
    fn handle(&self, _event: &DomainEvent) -> RepoResult<()> {
        self.seen.set(self.seen.get() + 1);
        Ok(())
    }
}

struct RejectingHandler;

impl DomainEventHandler for RejectingHandler {
    fn handle(&self, _event: &DomainEvent) -> RepoResult<()> {
        Err(RepoError::InvalidData("consumer offline".to_string()))
    }
}

#[test]
fn outbox_round_trips_events_in_publication_order() {
    let conn = setup();
    let outbox = SqliteDomainEventOutbox::try_new(&conn).unwrap();
    let factory = DomainEventFactory::new("test-origin");
    let vault = new_id();
    let user = new_id();

    let first = factory.create_user_removed_from_shared_vault_event(&vault, &user);
    let second = factory.create_shared_vault_removed_event(&vault);
    outbox.publish(&first).unwrap();
    outbox.publish(&second).unwrap();

    let pending = outbox.list_pending(10).unwrap();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].event, first);
    assert_eq!(pending[1].event, second);
    assert_eq!(pending[1].event.origin, "test-origin");
    assert!(pending[0].id < pending[1].id);

    assert!(outbox.mark_processed(pending[0].id).unwrap());
    assert!(!outbox.mark_processed(pending[0].id).unwrap());
    assert_eq!(outbox.list_pending(10).unwrap().len(), 1);
    assert_eq!(outbox.count_by_type("USER_REMOVED_FROM_SHARED_VAULT").unwrap(), 1);
}

#[test]
fn stored_payload_is_adjacently_tagged_json() {
    let conn = setup();
    let outbox = SqliteDomainEventOutbox::try_new(&conn).unwrap();
    let vault = new_id();
    outbox
        .publish(&DomainEventFactory::default().create_shared_vault_removed_event(&vault))
        .unwrap();

    let (event_type, origin, payload): (String, String, String) = conn
        .query_row(
            "SELECT event_type, origin, payload FROM domain_events;",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(event_type, "SHARED_VAULT_REMOVED");
    assert_eq!(origin, "syncing-server");

    let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(value["type"], "SHARED_VAULT_REMOVED");
    assert_eq!(value["payload"]["sharedVaultUuid"], vault.as_str());
}

#[test]
fn dispatch_marks_events_processed_once_all_handlers_accept() {
    let conn = setup();
    let outbox = SqliteDomainEventOutbox::try_new(&conn).unwrap();
    let factory = DomainEventFactory::default();
    for _ in 0..3 {
        outbox
            .publish(&factory.create_shared_vault_removed_event(&new_id()))
            .unwrap();
    }
    let counter = CountingHandler { seen: Cell::new(0) };

    assert_eq!(dispatch_pending(&outbox, &[&counter]).unwrap(), 3);
    assert_eq!(counter.seen.get(), 3);
    assert_eq!(dispatch_pending(&outbox, &[&counter]).unwrap(), 0);
    assert_eq!(counter.seen.get(), 3);
}

#[test]
fn failing_handler_leaves_event_pending() {
    let conn = setup();
    let outbox = SqliteDomainEventOutbox::try_new(&conn).unwrap();
    outbox
        .publish(&DomainEventFactory::default().create_shared_vault_removed_event(&new_id()))
        .unwrap();
    let counter = CountingHandler { seen: Cell::new(0) };

    let err = dispatch_pending(&outbox, &[&counter, &RejectingHandler]).unwrap_err();
    assert!(err.to_string().contains("consumer offline"));
    assert_eq!(outbox.list_pending(10).unwrap().len(), 1);
}

#[test]
fn item_removed_event_detaches_only_that_item() {
    let conn = setup();
    let owner = new_id();
    let vault = new_id();
    let item = new_id();
    let leaving = insert_revision(&conn, &item, &owner, Some(&vault), 1_000);
    let staying = insert_revision(&conn, &new_id(), &owner, Some(&vault), 2_000);

    let outbox = SqliteDomainEventOutbox::try_new(&conn).unwrap();
    outbox
        .publish(&DomainEventFactory::default().create_item_removed_from_shared_vault_event(&vault, &item))
        .unwrap();
    let handler = RevisionAssociationHandler::new(SqliteRevisionRepository::try_new(&conn).unwrap());
    assert_eq!(dispatch_pending(&outbox, &[&handler]).unwrap(), 1);

    let repo = SqliteRevisionRepository::try_new(&conn).unwrap();
    let leaving_after = repo
        .find_one_by_uuid(&leaving.uuid, &owner, &[])
        .unwrap()
        .unwrap();
    let staying_after = repo
        .find_one_by_uuid(&staying.uuid, &owner, &[])
        .unwrap()
        .unwrap();
    assert_eq!(leaving_after.shared_vault_uuid, None);
    assert_eq!(staying_after.shared_vault_uuid, Some(vault));
}

#[test]
fn user_removed_event_leaves_revisions_alone() {
    let conn = setup();
    let owner = new_id();
    let vault = new_id();
    let revision = insert_revision(&conn, &new_id(), &owner, Some(&vault), 1_000);
    let repo = SqliteRevisionRepository::try_new(&conn).unwrap();
    let handler = RevisionAssociationHandler::new(SqliteRevisionRepository::try_new(&conn).unwrap());

    let event = DomainEventFactory::default().create_user_removed_from_shared_vault_event(&vault, &owner);
    assert!(matches!(
        event.payload,
        DomainEventPayload::UserRemovedFromSharedVault { .. }
    ));
    handler.handle(&event).unwrap();

    let after = repo
        .find_one_by_uuid(&revision.uuid, &owner, &[])
        .unwrap()
        .unwrap();
    assert_eq!(after, revision);
}
