#![allow(dead_code)]

use rusqlite::Connection;
use vaultsync_core::db::open_db_in_memory;
use vaultsync_core::{
    Identifier, ItemUuid, Revision, RevisionRepository, SharedVault, SharedVaultInvite,
    SharedVaultInviteRepository, SharedVaultRepository, SharedVaultUser,
    SharedVaultUserPermission, SharedVaultUserRepository, SharedVaultUuid,
    SqliteRevisionRepository, SqliteSharedVaultInviteRepository, SqliteSharedVaultRepository,
    SqliteSharedVaultUserRepository, UserUuid,
};

pub fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

pub fn new_id() -> Identifier {
    Identifier::generate()
}

pub fn seed_vault(conn: &Connection, owner: &UserUuid) -> SharedVault {
    let vault = SharedVault::new(owner.clone(), 1_000);
    SqliteSharedVaultRepository::try_new(conn)
        .unwrap()
        .insert(&vault)
        .unwrap();
    vault
}

pub fn add_member(
    conn: &Connection,
    vault: &SharedVaultUuid,
    user: &UserUuid,
    created_at: i64,
) -> SharedVaultUser {
    let member = SharedVaultUser::new(
        vault.clone(),
        user.clone(),
        SharedVaultUserPermission::Write,
        created_at,
    );
    SqliteSharedVaultUserRepository::try_new(conn)
        .unwrap()
        .insert(&member)
        .unwrap();
    member
}

pub fn add_invite(
    conn: &Connection,
    vault: &SharedVaultUuid,
    invitee: &UserUuid,
    sender: &UserUuid,
    created_at: i64,
) -> SharedVaultInvite {
    let invite = SharedVaultInvite::new(
        vault.clone(),
        invitee.clone(),
        sender.clone(),
        SharedVaultUserPermission::Read,
        created_at,
    );
    SqliteSharedVaultInviteRepository::try_new(conn)
        .unwrap()
        .insert(&invite)
        .unwrap();
    invite
}

pub fn insert_revision(
    conn: &Connection,
    item: &ItemUuid,
    owner: &UserUuid,
    vault: Option<&SharedVaultUuid>,
    created_at: i64,
) -> Revision {
    let mut revision = Revision::new(item.clone(), owner.clone(), "Note", created_at);
    revision.content = Some("004:encrypted".to_string());
    revision.items_key_id = Some("items-key-1".to_string());
    if let Some(vault) = vault {
        revision.shared_vault_uuid = Some(vault.clone());
        revision.key_system_identifier = Some(format!("ks-{vault}"));
    }
    SqliteRevisionRepository::try_new(conn)
        .unwrap()
        .insert(&revision)
        .unwrap();
    revision
}

pub fn count_rows(conn: &Connection, table: &str, vault: &SharedVaultUuid) -> i64 {
    let column = if table == "shared_vaults" {
        "uuid"
    } else {
        "shared_vault_uuid"
    };
    conn.query_row(
        &format!("SELECT COUNT(*) FROM {table} WHERE {column} = ?1;"),
        [vault.as_str()],
        |row| row.get(0),
    )
    .unwrap()
}

pub fn count_events(conn: &Connection, event_type: &str) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM domain_events WHERE event_type = ?1;",
        [event_type],
        |row| row.get(0),
    )
    .unwrap()
}
