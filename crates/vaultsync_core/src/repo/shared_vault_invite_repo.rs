//! Shared vault invite repository contract and SQLite implementation.

use crate::model::identifier::{InviteUuid, SharedVaultUuid};
use crate::model::shared_vault::{SharedVaultInvite, SharedVaultUserPermission};
use crate::repo::{ensure_table_ready, parse_identifier, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const SHARED_VAULT_INVITE_COLUMNS: &[&str] = &[
    "uuid",
    "shared_vault_uuid",
    "user_uuid",
    "sender_uuid",
    "encrypted_message",
    "permission",
    "created_at",
    "updated_at",
];

const SHARED_VAULT_INVITE_SELECT_SQL: &str = "SELECT
    uuid,
    shared_vault_uuid,
    user_uuid,
    sender_uuid,
    encrypted_message,
    permission,
    created_at,
    updated_at
FROM shared_vault_invites";

/// Repository interface for pending vault invites.
pub trait SharedVaultInviteRepository {
    fn find_by_uuid(&self, uuid: &InviteUuid) -> RepoResult<Option<SharedVaultInvite>>;
    fn find_by_shared_vault_uuid(
        &self,
        shared_vault_uuid: &SharedVaultUuid,
    ) -> RepoResult<Vec<SharedVaultInvite>>;
    fn insert(&self, invite: &SharedVaultInvite) -> RepoResult<()>;
    fn remove(&self, invite: &SharedVaultInvite) -> RepoResult<()>;
}

/// SQLite-backed invite repository.
pub struct SqliteSharedVaultInviteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSharedVaultInviteRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "shared_vault_invites", SHARED_VAULT_INVITE_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl SharedVaultInviteRepository for SqliteSharedVaultInviteRepository<'_> {
    fn find_by_uuid(&self, uuid: &InviteUuid) -> RepoResult<Option<SharedVaultInvite>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SHARED_VAULT_INVITE_SELECT_SQL} WHERE uuid = ?1;"
        ))?;
        let mut rows = stmt.query([uuid.as_str()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_invite_row(row)?));
        }
        Ok(None)
    }

    fn find_by_shared_vault_uuid(
        &self,
        shared_vault_uuid: &SharedVaultUuid,
    ) -> RepoResult<Vec<SharedVaultInvite>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SHARED_VAULT_INVITE_SELECT_SQL}
             WHERE shared_vault_uuid = ?1
             ORDER BY created_at ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([shared_vault_uuid.as_str()])?;
        let mut invites = Vec::new();
        while let Some(row) = rows.next()? {
            invites.push(parse_invite_row(row)?);
        }
        Ok(invites)
    }

    fn insert(&self, invite: &SharedVaultInvite) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO shared_vault_invites (
                uuid,
                shared_vault_uuid,
                user_uuid,
                sender_uuid,
                encrypted_message,
                permission,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                invite.uuid.as_str(),
                invite.shared_vault_uuid.as_str(),
                invite.user_uuid.as_str(),
                invite.sender_uuid.as_str(),
                invite.encrypted_message.as_str(),
                invite.permission.as_db(),
                invite.created_at,
                invite.updated_at,
            ],
        )?;
        Ok(())
    }

    fn remove(&self, invite: &SharedVaultInvite) -> RepoResult<()> {
        self.conn.execute(
            "DELETE FROM shared_vault_invites WHERE uuid = ?1;",
            [invite.uuid.as_str()],
        )?;
        Ok(())
    }
}

fn parse_invite_row(row: &Row<'_>) -> RepoResult<SharedVaultInvite> {
    let uuid: String = row.get("uuid")?;
    let shared_vault_uuid: String = row.get("shared_vault_uuid")?;
    let user_uuid: String = row.get("user_uuid")?;
    let sender_uuid: String = row.get("sender_uuid")?;
    let permission_text: String = row.get("permission")?;
    let permission = SharedVaultUserPermission::from_db(&permission_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid permission `{permission_text}` in shared_vault_invites.permission"
        ))
    })?;

    Ok(SharedVaultInvite {
        uuid: parse_identifier(&uuid, "shared_vault_invites.uuid")?,
        shared_vault_uuid: parse_identifier(
            &shared_vault_uuid,
            "shared_vault_invites.shared_vault_uuid",
        )?,
        user_uuid: parse_identifier(&user_uuid, "shared_vault_invites.user_uuid")?,
        sender_uuid: parse_identifier(&sender_uuid, "shared_vault_invites.sender_uuid")?,
        encrypted_message: row.get("encrypted_message")?,
        permission,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
