mod common;

use common::{add_invite, add_member, count_events, count_rows, new_id, seed_vault, setup};
use rusqlite::Connection;
use vaultsync_core::{
    DeclineInviteToSharedVault, DeclineInviteToSharedVaultRequest, DeclineSharedVaultInvite,
    DomainEventFactory, RemoveSharedVaultUser, RemoveUserFromSharedVault,
    RemoveUserFromSharedVaultRequest, SharedVaultErrorKind, SharedVaultResult,
    SqliteDomainEventOutbox, SqliteSharedVaultInviteRepository, SqliteSharedVaultRepository,
    SqliteSharedVaultUserRepository,
};

fn remove_user(conn: &Connection, request: RemoveUserFromSharedVaultRequest) -> SharedVaultResult<()> {
    let vaults = SqliteSharedVaultRepository::try_new(conn).unwrap();
    let users = SqliteSharedVaultUserRepository::try_new(conn).unwrap();
    let outbox = SqliteDomainEventOutbox::try_new(conn).unwrap();
    let factory = DomainEventFactory::default();
    RemoveUserFromSharedVault::new(&vaults, &users, &factory, &outbox).execute(&request)
}

fn decline(conn: &Connection, invite_uuid: &str, user_uuid: &str) -> SharedVaultResult<()> {
    let invites = SqliteSharedVaultInviteRepository::try_new(conn).unwrap();
    DeclineInviteToSharedVault::new(&invites).execute(&DeclineInviteToSharedVaultRequest {
        invite_uuid: invite_uuid.to_string(),
        user_uuid: user_uuid.to_string(),
    })
}

fn request(originator: &str, vault: &str, user: &str, force: bool) -> RemoveUserFromSharedVaultRequest {
    RemoveUserFromSharedVaultRequest {
        originator_uuid: originator.to_string(),
        shared_vault_uuid: vault.to_string(),
        user_uuid: user.to_string(),
        force_remove_owner: force,
    }
}

#[test]
fn owner_removes_member_and_event_is_published() {
    let conn = setup();
    let owner = new_id();
    let member = new_id();
    let vault = seed_vault(&conn, &owner);
    add_member(&conn, &vault.uuid, &owner, 1);
    add_member(&conn, &vault.uuid, &member, 2);

    remove_user(
        &conn,
        request(owner.as_str(), vault.uuid.as_str(), member.as_str(), false),
    )
    .unwrap();

    assert_eq!(count_rows(&conn, "shared_vault_users", &vault.uuid), 1);
    assert_eq!(count_events(&conn, "USER_REMOVED_FROM_SHARED_VAULT"), 1);
}

#[test]
fn member_may_leave_on_their_own() {
    let conn = setup();
    let owner = new_id();
    let member = new_id();
    let vault = seed_vault(&conn, &owner);
    add_member(&conn, &vault.uuid, &member, 1);

    remove_user(
        &conn,
        request(member.as_str(), vault.uuid.as_str(), member.as_str(), false),
    )
    .unwrap();

    assert_eq!(count_rows(&conn, "shared_vault_users", &vault.uuid), 0);
}

#[test]
fn non_owner_cannot_remove_someone_else() {
    let conn = setup();
    let owner = new_id();
    let member = new_id();
    let other = new_id();
    let vault = seed_vault(&conn, &owner);
    add_member(&conn, &vault.uuid, &member, 1);
    add_member(&conn, &vault.uuid, &other, 2);

    let err = remove_user(
        &conn,
        request(member.as_str(), vault.uuid.as_str(), other.as_str(), false),
    )
    .unwrap_err();

    assert_eq!(err.to_string(), "Only owner can remove users from shared vault");
    assert_eq!(err.kind(), SharedVaultErrorKind::Authorization);
    assert_eq!(count_rows(&conn, "shared_vault_users", &vault.uuid), 2);
    assert_eq!(count_events(&conn, "USER_REMOVED_FROM_SHARED_VAULT"), 0);
}

#[test]
fn owner_membership_needs_force_flag() {
    let conn = setup();
    let owner = new_id();
    let vault = seed_vault(&conn, &owner);
    add_member(&conn, &vault.uuid, &owner, 1);

    let err = remove_user(
        &conn,
        request(owner.as_str(), vault.uuid.as_str(), owner.as_str(), false),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Owner cannot be removed from shared vault");
    assert_eq!(count_rows(&conn, "shared_vault_users", &vault.uuid), 1);

    remove_user(
        &conn,
        request(owner.as_str(), vault.uuid.as_str(), owner.as_str(), true),
    )
    .unwrap();
    assert_eq!(count_rows(&conn, "shared_vault_users", &vault.uuid), 0);
}

#[test]
fn removing_non_member_or_from_missing_vault_fails() {
    let conn = setup();
    let owner = new_id();
    let vault = seed_vault(&conn, &owner);

    let err = remove_user(
        &conn,
        request(owner.as_str(), vault.uuid.as_str(), new_id().as_str(), false),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "User is not a member of the shared vault");
    assert_eq!(err.kind(), SharedVaultErrorKind::NotFound);

    let err = remove_user(
        &conn,
        request(owner.as_str(), new_id().as_str(), owner.as_str(), false),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Shared vault not found");

    let err = remove_user(
        &conn,
        request(owner.as_str(), "vault-1", owner.as_str(), false),
    )
    .unwrap_err();
    assert_eq!(err.kind(), SharedVaultErrorKind::Validation);
}

#[test]
fn recipient_declines_invite_and_row_is_removed() {
    let conn = setup();
    let owner = new_id();
    let invitee = new_id();
    let vault = seed_vault(&conn, &owner);
    let invite = add_invite(&conn, &vault.uuid, &invitee, &owner, 1);

    decline(&conn, invite.uuid.as_str(), invitee.as_str()).unwrap();
    assert_eq!(count_rows(&conn, "shared_vault_invites", &vault.uuid), 0);

    let err = decline(&conn, invite.uuid.as_str(), invitee.as_str()).unwrap_err();
    assert_eq!(err.to_string(), "Invite not found");
}

#[test]
fn only_recipient_can_decline() {
    let conn = setup();
    let owner = new_id();
    let invitee = new_id();
    let vault = seed_vault(&conn, &owner);
    let invite = add_invite(&conn, &vault.uuid, &invitee, &owner, 1);

    let err = decline(&conn, invite.uuid.as_str(), owner.as_str()).unwrap_err();
    assert_eq!(err.to_string(), "Only the recipient of an invite can decline it");
    assert_eq!(count_rows(&conn, "shared_vault_invites", &vault.uuid), 1);
}

#[test]
fn identifiers_are_case_insensitive_on_input() {
    let conn = setup();
    let owner = new_id();
    let invitee = new_id();
    let vault = seed_vault(&conn, &owner);
    let invite = add_invite(&conn, &vault.uuid, &invitee, &owner, 1);

    decline(
        &conn,
        &invite.uuid.as_str().to_ascii_uppercase(),
        &invitee.as_str().to_ascii_uppercase(),
    )
    .unwrap();
    assert_eq!(count_rows(&conn, "shared_vault_invites", &vault.uuid), 0);
}
