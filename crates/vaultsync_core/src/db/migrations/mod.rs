//! Versioned custody schema.
//!
//! | version | adds |
//! |---|---|
//! | 1 | `revisions` with item, owner and vault indexes |
//! | 2 | `shared_vaults`, `shared_vault_users`, `shared_vault_invites` |
//! | 3 | `domain_events` outbox |
//!
//! The applied version lives in `PRAGMA user_version`. All pending steps run
//! in one transaction, so a file is either fully upgraded or untouched.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, Transaction};

struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "revisions",
        sql: include_str!("0001_revisions.sql"),
    },
    SchemaStep {
        version: 2,
        name: "shared_vaults",
        sql: include_str!("0002_shared_vaults.sql"),
    },
    SchemaStep {
        version: 3,
        name: "domain_events",
        sql: include_str!("0003_domain_events.sql"),
    },
];

/// Highest schema version this binary can open.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Reads the schema version stamped on `conn`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

/// Brings `conn` up to [`latest_version`].
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from = schema_version(conn)?;
    let latest = latest_version();
    if from > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: latest,
        });
    }

    let pending = SCHEMA_STEPS
        .iter()
        .filter(|step| step.version > from)
        .collect::<Vec<_>>();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in pending {
        run_step(&tx, step)?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={}",
        from, latest
    );
    Ok(())
}

fn run_step(tx: &Transaction<'_>, step: &SchemaStep) -> DbResult<()> {
    tx.execute_batch(step.sql)
        .and_then(|()| tx.pragma_update(None, "user_version", step.version))
        .map_err(|source| DbError::MigrationFailed {
            version: step.version,
            name: step.name,
            source,
        })?;
    info!(
        "event=db_migrate module=db status=step version={} name={}",
        step.version, step.name
    );
    Ok(())
}
