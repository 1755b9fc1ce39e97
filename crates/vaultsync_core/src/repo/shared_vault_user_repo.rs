//! Shared vault membership repository contract and SQLite implementation.
//!
//! # Invariants
//! - One membership row per `(shared_vault_uuid, user_uuid)`.
//! - Listing order is `created_at ASC, uuid ASC`.

use crate::model::identifier::{SharedVaultUuid, UserUuid};
use crate::model::shared_vault::{SharedVaultUser, SharedVaultUserPermission};
use crate::repo::{ensure_table_ready, parse_identifier, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const SHARED_VAULT_USER_COLUMNS: &[&str] = &[
    "uuid",
    "shared_vault_uuid",
    "user_uuid",
    "permission",
    "created_at",
    "updated_at",
];

const SHARED_VAULT_USER_SELECT_SQL: &str = "SELECT
    uuid,
    shared_vault_uuid,
    user_uuid,
    permission,
    created_at,
    updated_at
FROM shared_vault_users";

/// Repository interface for vault memberships.
pub trait SharedVaultUserRepository {
    fn find_by_shared_vault_uuid(
        &self,
        shared_vault_uuid: &SharedVaultUuid,
    ) -> RepoResult<Vec<SharedVaultUser>>;
    fn find_by_user_uuid_and_shared_vault_uuid(
        &self,
        user_uuid: &UserUuid,
        shared_vault_uuid: &SharedVaultUuid,
    ) -> RepoResult<Option<SharedVaultUser>>;
    /// Returns the vaults `user_uuid` belongs to; this is the membership set
    /// revision reads are scoped with.
    fn find_shared_vault_uuids_by_user_uuid(
        &self,
        user_uuid: &UserUuid,
    ) -> RepoResult<Vec<SharedVaultUuid>>;
    fn insert(&self, shared_vault_user: &SharedVaultUser) -> RepoResult<()>;
    fn remove(&self, shared_vault_user: &SharedVaultUser) -> RepoResult<()>;
}

/// SQLite-backed membership repository.
pub struct SqliteSharedVaultUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSharedVaultUserRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "shared_vault_users", SHARED_VAULT_USER_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl SharedVaultUserRepository for SqliteSharedVaultUserRepository<'_> {
    fn find_by_shared_vault_uuid(
        &self,
        shared_vault_uuid: &SharedVaultUuid,
    ) -> RepoResult<Vec<SharedVaultUser>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SHARED_VAULT_USER_SELECT_SQL}
             WHERE shared_vault_uuid = ?1
             ORDER BY created_at ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([shared_vault_uuid.as_str()])?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_shared_vault_user_row(row)?);
        }
        Ok(members)
    }

    fn find_by_user_uuid_and_shared_vault_uuid(
        &self,
        user_uuid: &UserUuid,
        shared_vault_uuid: &SharedVaultUuid,
    ) -> RepoResult<Option<SharedVaultUser>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SHARED_VAULT_USER_SELECT_SQL}
             WHERE user_uuid = ?1
               AND shared_vault_uuid = ?2;"
        ))?;
        let mut rows = stmt.query(params![user_uuid.as_str(), shared_vault_uuid.as_str()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_shared_vault_user_row(row)?));
        }
        Ok(None)
    }

    fn find_shared_vault_uuids_by_user_uuid(
        &self,
        user_uuid: &UserUuid,
    ) -> RepoResult<Vec<SharedVaultUuid>> {
        let mut stmt = self.conn.prepare(
            "SELECT shared_vault_uuid
             FROM shared_vault_users
             WHERE user_uuid = ?1
             ORDER BY created_at ASC, uuid ASC;",
        )?;
        let mut rows = stmt.query([user_uuid.as_str()])?;
        let mut vaults = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            vaults.push(parse_identifier(&value, "shared_vault_users.shared_vault_uuid")?);
        }
        Ok(vaults)
    }

    fn insert(&self, shared_vault_user: &SharedVaultUser) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO shared_vault_users (
                uuid,
                shared_vault_uuid,
                user_uuid,
                permission,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                shared_vault_user.uuid.as_str(),
                shared_vault_user.shared_vault_uuid.as_str(),
                shared_vault_user.user_uuid.as_str(),
                shared_vault_user.permission.as_db(),
                shared_vault_user.created_at,
                shared_vault_user.updated_at,
            ],
        )?;
        Ok(())
    }

    fn remove(&self, shared_vault_user: &SharedVaultUser) -> RepoResult<()> {
        self.conn.execute(
            "DELETE FROM shared_vault_users WHERE uuid = ?1;",
            [shared_vault_user.uuid.as_str()],
        )?;
        Ok(())
    }
}

fn parse_shared_vault_user_row(row: &Row<'_>) -> RepoResult<SharedVaultUser> {
    let uuid: String = row.get("uuid")?;
    let shared_vault_uuid: String = row.get("shared_vault_uuid")?;
    let user_uuid: String = row.get("user_uuid")?;
    let permission_text: String = row.get("permission")?;
    let permission = SharedVaultUserPermission::from_db(&permission_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid permission `{permission_text}` in shared_vault_users.permission"
        ))
    })?;

    Ok(SharedVaultUser {
        uuid: parse_identifier(&uuid, "shared_vault_users.uuid")?,
        shared_vault_uuid: parse_identifier(
            &shared_vault_uuid,
            "shared_vault_users.shared_vault_uuid",
        )?,
        user_uuid: parse_identifier(&user_uuid, "shared_vault_users.user_uuid")?,
        permission,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
