//! Revision repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide tenant-scoped read/delete access over `revisions` storage.
//! - Detach revisions from shared vaults without destroying them.
//!
//! # Invariants
//! - A revision is readable iff the requester owns it or its
//!   `shared_vault_uuid` is in the requester's membership set.
//! - An empty membership set degrades to a pure ownership query; the
//!   `shared_vault_uuid` column is not consulted at all.
//! - Single-row and listing reads share one visibility clause builder.
//! - Detachment writes only `shared_vault_uuid` and `key_system_identifier`.

use crate::model::identifier::{ItemUuid, RevisionUuid, SharedVaultUuid, UserUuid};
use crate::model::revision::{Revision, RevisionMetadata};
use crate::repo::{
    ensure_table_ready, parse_identifier, parse_optional_identifier, RepoError, RepoResult,
};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const REVISION_COLUMNS: &[&str] = &[
    "uuid",
    "item_uuid",
    "user_uuid",
    "content",
    "content_type",
    "items_key_id",
    "enc_item_key",
    "auth_hash",
    "shared_vault_uuid",
    "key_system_identifier",
    "created_at",
    "updated_at",
];

const REVISION_SELECT_SQL: &str = "SELECT
    uuid,
    item_uuid,
    user_uuid,
    content,
    content_type,
    items_key_id,
    enc_item_key,
    auth_hash,
    shared_vault_uuid,
    key_system_identifier,
    created_at,
    updated_at
FROM revisions";

const REVISION_METADATA_SELECT_SQL: &str = "SELECT
    uuid,
    item_uuid,
    content_type,
    shared_vault_uuid,
    created_at,
    updated_at
FROM revisions";

/// Scope for detaching revisions from a shared vault.
///
/// With `item_uuid` set only that item's revisions inside the vault are
/// detached; otherwise every revision in the vault is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationClearScope {
    pub item_uuid: Option<ItemUuid>,
    pub shared_vault_uuid: SharedVaultUuid,
}

impl AssociationClearScope {
    pub fn vault(shared_vault_uuid: SharedVaultUuid) -> Self {
        Self {
            item_uuid: None,
            shared_vault_uuid,
        }
    }

    pub fn item(item_uuid: ItemUuid, shared_vault_uuid: SharedVaultUuid) -> Self {
        Self {
            item_uuid: Some(item_uuid),
            shared_vault_uuid,
        }
    }
}

/// Repository interface for revision storage.
pub trait RevisionRepository {
    /// Stores one new revision.
    fn insert(&self, revision: &Revision) -> RepoResult<()>;
    /// Loads one revision visible to `user_uuid` through ownership or membership.
    fn find_one_by_uuid(
        &self,
        revision_uuid: &RevisionUuid,
        user_uuid: &UserUuid,
        shared_vault_uuids: &[SharedVaultUuid],
    ) -> RepoResult<Option<Revision>>;
    /// Lists visible revision metadata of one item, most recent first.
    fn find_metadata_by_item_id(
        &self,
        item_uuid: &ItemUuid,
        user_uuid: &UserUuid,
        shared_vault_uuids: &[SharedVaultUuid],
    ) -> RepoResult<Vec<RevisionMetadata>>;
    /// Deletes at most one revision owned by `user_uuid`. Missing rows are not an error.
    fn remove_one_by_uuid(&self, revision_uuid: &RevisionUuid, user_uuid: &UserUuid)
        -> RepoResult<()>;
    /// Deletes every revision owned by `user_uuid` and returns how many were removed.
    fn remove_by_user_uuid(&self, user_uuid: &UserUuid) -> RepoResult<usize>;
    /// Nulls the shared vault and key system columns in scope; returns rows touched.
    fn clear_shared_vault_and_key_system_associations(
        &self,
        scope: &AssociationClearScope,
    ) -> RepoResult<usize>;
}

/// SQLite-backed revision repository.
pub struct SqliteRevisionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRevisionRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "revisions", REVISION_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl RevisionRepository for SqliteRevisionRepository<'_> {
    fn insert(&self, revision: &Revision) -> RepoResult<()> {
        revision.validate()?;

        self.conn.execute(
            "INSERT INTO revisions (
                uuid,
                item_uuid,
                user_uuid,
                content,
                content_type,
                items_key_id,
                enc_item_key,
                auth_hash,
                shared_vault_uuid,
                key_system_identifier,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
            params![
                revision.uuid.as_str(),
                revision.item_uuid.as_str(),
                revision.user_uuid.as_str(),
                revision.content.as_deref(),
                revision.content_type.as_str(),
                revision.items_key_id.as_deref(),
                revision.enc_item_key.as_deref(),
                revision.auth_hash.as_deref(),
                revision.shared_vault_uuid.as_ref().map(|id| id.as_str()),
                revision.key_system_identifier.as_deref(),
                revision.created_at,
                revision.updated_at,
            ],
        )?;

        Ok(())
    }

    fn find_one_by_uuid(
        &self,
        revision_uuid: &RevisionUuid,
        user_uuid: &UserUuid,
        shared_vault_uuids: &[SharedVaultUuid],
    ) -> RepoResult<Option<Revision>> {
        let mut sql = format!("{REVISION_SELECT_SQL} WHERE uuid = ?");
        let mut bind_values = vec![Value::Text(revision_uuid.to_string())];
        push_visibility_clause(&mut sql, &mut bind_values, user_uuid, shared_vault_uuids)?;
        sql.push_str(" LIMIT 1");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_revision_row(row)?));
        }

        Ok(None)
    }

    fn find_metadata_by_item_id(
        &self,
        item_uuid: &ItemUuid,
        user_uuid: &UserUuid,
        shared_vault_uuids: &[SharedVaultUuid],
    ) -> RepoResult<Vec<RevisionMetadata>> {
        let mut sql = format!("{REVISION_METADATA_SELECT_SQL} WHERE item_uuid = ?");
        let mut bind_values = vec![Value::Text(item_uuid.to_string())];
        push_visibility_clause(&mut sql, &mut bind_values, user_uuid, shared_vault_uuids)?;
        sql.push_str(" ORDER BY created_at DESC, uuid ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut metadata = Vec::new();
        while let Some(row) = rows.next()? {
            metadata.push(parse_metadata_row(row)?);
        }

        debug!(
            "event=revision_metadata_list module=repo status=ok item={} vault_scopes={} count={}",
            item_uuid,
            shared_vault_uuids.len(),
            metadata.len()
        );

        Ok(metadata)
    }

    fn remove_one_by_uuid(
        &self,
        revision_uuid: &RevisionUuid,
        user_uuid: &UserUuid,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM revisions WHERE uuid = ?1 AND user_uuid = ?2;",
            params![revision_uuid.as_str(), user_uuid.as_str()],
        )?;

        if changed == 0 {
            debug!(
                "event=revision_remove module=repo status=skip revision={} reason=no_match",
                revision_uuid
            );
        }

        Ok(())
    }

    fn remove_by_user_uuid(&self, user_uuid: &UserUuid) -> RepoResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM revisions WHERE user_uuid = ?1;",
            [user_uuid.as_str()],
        )?;
        Ok(removed)
    }

    fn clear_shared_vault_and_key_system_associations(
        &self,
        scope: &AssociationClearScope,
    ) -> RepoResult<usize> {
        let changed = match scope.item_uuid.as_ref() {
            Some(item_uuid) => self.conn.execute(
                "UPDATE revisions
                 SET
                    shared_vault_uuid = NULL,
                    key_system_identifier = NULL
                 WHERE item_uuid = ?1
                   AND shared_vault_uuid = ?2;",
                params![item_uuid.as_str(), scope.shared_vault_uuid.as_str()],
            )?,
            None => self.conn.execute(
                "UPDATE revisions
                 SET
                    shared_vault_uuid = NULL,
                    key_system_identifier = NULL
                 WHERE shared_vault_uuid = ?1;",
                [scope.shared_vault_uuid.as_str()],
            )?,
        };

        Ok(changed)
    }
}

/// Appends the ownership-or-membership predicate.
///
/// With no memberships the `shared_vault_uuid` column is left out entirely,
/// so the query can never match on it. Otherwise the whole set is bound as
/// one JSON array and expanded with `json_each`, which keeps the statement at
/// two parameters however many vaults the requester belongs to.
fn push_visibility_clause(
    sql: &mut String,
    bind_values: &mut Vec<Value>,
    user_uuid: &UserUuid,
    shared_vault_uuids: &[SharedVaultUuid],
) -> RepoResult<()> {
    bind_values.push(Value::Text(user_uuid.to_string()));
    if shared_vault_uuids.is_empty() {
        sql.push_str(" AND user_uuid = ?");
        return Ok(());
    }

    sql.push_str(
        " AND (user_uuid = ? OR shared_vault_uuid IN (SELECT value FROM json_each(?)))",
    );
    bind_values.push(Value::Text(serde_json::to_string(shared_vault_uuids)?));
    Ok(())
}

fn parse_revision_row(row: &Row<'_>) -> RepoResult<Revision> {
    let uuid: String = row.get("uuid")?;
    let item_uuid: String = row.get("item_uuid")?;
    let user_uuid: String = row.get("user_uuid")?;

    let revision = Revision {
        uuid: parse_identifier(&uuid, "revisions.uuid")?,
        item_uuid: parse_identifier(&item_uuid, "revisions.item_uuid")?,
        user_uuid: parse_identifier(&user_uuid, "revisions.user_uuid")?,
        content: row.get("content")?,
        content_type: row.get("content_type")?,
        items_key_id: row.get("items_key_id")?,
        enc_item_key: row.get("enc_item_key")?,
        auth_hash: row.get("auth_hash")?,
        shared_vault_uuid: parse_optional_identifier(
            row.get("shared_vault_uuid")?,
            "revisions.shared_vault_uuid",
        )?,
        key_system_identifier: row.get("key_system_identifier")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    revision.validate().map_err(|err| {
        RepoError::InvalidData(format!("revision {} violates its invariants: {err}", revision.uuid))
    })?;
    Ok(revision)
}

fn parse_metadata_row(row: &Row<'_>) -> RepoResult<RevisionMetadata> {
    let uuid: String = row.get("uuid")?;
    let item_uuid: String = row.get("item_uuid")?;

    Ok(RevisionMetadata {
        uuid: parse_identifier(&uuid, "revisions.uuid")?,
        item_uuid: parse_identifier(&item_uuid, "revisions.item_uuid")?,
        content_type: row.get("content_type")?,
        shared_vault_uuid: parse_optional_identifier(
            row.get("shared_vault_uuid")?,
            "revisions.shared_vault_uuid",
        )?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
