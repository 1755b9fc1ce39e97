//! Domain event publication and the durable SQLite outbox.
//!
//! # Responsibility
//! - Accept events from use cases once their storage effects are committed.
//! - Persist events so downstream consumers see every one of them.
//!
//! # Invariants
//! - Pending events are delivered in publication order (`id ASC`).
//! - An event is marked processed at most once.

use crate::event::{DomainEvent, DomainEventPayload};
use crate::repo::{ensure_table_ready, parse_identifier, RepoResult};
use log::info;
use rusqlite::{params, Connection, Row};

const DOMAIN_EVENT_COLUMNS: &[&str] = &[
    "id",
    "uuid",
    "event_type",
    "origin",
    "payload",
    "created_at",
    "processed_at",
];

/// Sink for domain events.
pub trait DomainEventPublisher {
    fn publish(&self, event: &DomainEvent) -> RepoResult<()>;
}

/// Event read back from the outbox with its delivery sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDomainEvent {
    pub id: i64,
    pub event: DomainEvent,
}

/// SQLite-backed durable publisher.
pub struct SqliteDomainEventOutbox<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDomainEventOutbox<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "domain_events", DOMAIN_EVENT_COLUMNS)?;
        Ok(Self { conn })
    }

    /// Returns unprocessed events, oldest first.
    pub fn list_pending(&self, limit: u32) -> RepoResult<Vec<StoredDomainEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, uuid, origin, payload, created_at
             FROM domain_events
             WHERE processed_at IS NULL
             ORDER BY id ASC
             LIMIT ?1;",
        )?;
        let mut rows = stmt.query([i64::from(limit)])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_stored_event_row(row)?);
        }
        Ok(events)
    }

    /// Marks one event processed. Returns `false` when it already was.
    pub fn mark_processed(&self, id: i64) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE domain_events
             SET processed_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND processed_at IS NULL;",
            [id],
        )?;
        Ok(changed == 1)
    }

    /// Counts events of one type, processed or not.
    pub fn count_by_type(&self, event_type: &str) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM domain_events WHERE event_type = ?1;",
            [event_type],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

impl DomainEventPublisher for SqliteDomainEventOutbox<'_> {
    fn publish(&self, event: &DomainEvent) -> RepoResult<()> {
        let payload = serde_json::to_string(&event.payload)?;
        self.conn.execute(
            "INSERT INTO domain_events (
                uuid,
                event_type,
                origin,
                payload,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                event.uuid.as_str(),
                event.event_type(),
                event.origin.as_str(),
                payload,
                event.created_at,
            ],
        )?;

        info!(
            "event=domain_event_publish module=event status=ok type={} event_uuid={}",
            event.event_type(),
            event.uuid
        );
        Ok(())
    }
}

fn parse_stored_event_row(row: &Row<'_>) -> RepoResult<StoredDomainEvent> {
    let uuid: String = row.get("uuid")?;
    let payload_text: String = row.get("payload")?;
    let payload: DomainEventPayload = serde_json::from_str(&payload_text)?;

    Ok(StoredDomainEvent {
        id: row.get("id")?,
        event: DomainEvent {
            uuid: parse_identifier(&uuid, "domain_events.uuid")?,
            created_at: row.get("created_at")?,
            origin: row.get("origin")?,
            payload,
        },
    })
}
