//! Shared vault repository contract and SQLite implementation.

use crate::model::identifier::SharedVaultUuid;
use crate::model::shared_vault::SharedVault;
use crate::repo::{ensure_table_ready, parse_identifier, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const SHARED_VAULT_COLUMNS: &[&str] = &[
    "uuid",
    "user_uuid",
    "file_upload_bytes_used",
    "created_at",
    "updated_at",
];

/// Repository interface for shared vault records.
pub trait SharedVaultRepository {
    fn find_by_uuid(&self, uuid: &SharedVaultUuid) -> RepoResult<Option<SharedVault>>;
    fn insert(&self, shared_vault: &SharedVault) -> RepoResult<()>;
    /// Deletes the vault row, keeping the deletion only if `on_removed`
    /// succeeds. Dependent members/invites must already be gone.
    fn remove_with(
        &self,
        shared_vault: &SharedVault,
        on_removed: &dyn Fn() -> RepoResult<()>,
    ) -> RepoResult<()>;

    /// Deletes the vault row.
    fn remove(&self, shared_vault: &SharedVault) -> RepoResult<()> {
        self.remove_with(shared_vault, &|| Ok(()))
    }
}

/// SQLite-backed shared vault repository.
pub struct SqliteSharedVaultRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSharedVaultRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "shared_vaults", SHARED_VAULT_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl SharedVaultRepository for SqliteSharedVaultRepository<'_> {
    fn find_by_uuid(&self, uuid: &SharedVaultUuid) -> RepoResult<Option<SharedVault>> {
        let row = self
            .conn
            .query_row(
                "SELECT uuid, user_uuid, file_upload_bytes_used, created_at, updated_at
                 FROM shared_vaults
                 WHERE uuid = ?1;",
                [uuid.as_str()],
                SharedVaultRow::from_row,
            )
            .optional()?;

        row.map(SharedVaultRow::into_record).transpose()
    }

    fn insert(&self, shared_vault: &SharedVault) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO shared_vaults (
                uuid,
                user_uuid,
                file_upload_bytes_used,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                shared_vault.uuid.as_str(),
                shared_vault.user_uuid.as_str(),
                shared_vault.file_upload_bytes_used,
                shared_vault.created_at,
                shared_vault.updated_at,
            ],
        )?;
        Ok(())
    }

    fn remove_with(
        &self,
        shared_vault: &SharedVault,
        on_removed: &dyn Fn() -> RepoResult<()>,
    ) -> RepoResult<()> {
        // Writes made by `on_removed` on this connection join the same
        // transaction; an early return rolls everything back on drop.
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM shared_vaults WHERE uuid = ?1;",
            [shared_vault.uuid.as_str()],
        )?;
        on_removed()?;
        tx.commit()?;
        Ok(())
    }
}

struct SharedVaultRow {
    uuid: String,
    user_uuid: String,
    file_upload_bytes_used: i64,
    created_at: i64,
    updated_at: i64,
}

impl SharedVaultRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            uuid: row.get("uuid")?,
            user_uuid: row.get("user_uuid")?,
            file_upload_bytes_used: row.get("file_upload_bytes_used")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn into_record(self) -> RepoResult<SharedVault> {
        Ok(SharedVault {
            uuid: parse_identifier(&self.uuid, "shared_vaults.uuid")?,
            user_uuid: parse_identifier(&self.user_uuid, "shared_vaults.user_uuid")?,
            file_upload_bytes_used: self.file_upload_bytes_used,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
