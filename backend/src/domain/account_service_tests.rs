//! Tests for the account service against mocked ports.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rstest::rstest;

use super::*;
use crate::domain::ports::{MockAccountStore, MockPasswordHasher};
use crate::domain::{AccountParts, ErrorCode, SocialLinks};

const STORED_HASH: &str = "$argon2id$v=19$stored";

fn id(raw: i64) -> AccountId {
    AccountId::new(raw).expect("positive id")
}

fn stored_account(raw_id: i64, active: bool) -> Account {
    let at = Utc
        .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp");
    let username = Username::new("alice").expect("valid username");
    Account::from_parts(AccountParts {
        id: id(raw_id),
        username: username.clone(),
        email: Email::new("a@x.com").expect("valid email"),
        password_hash: PasswordHash::from_encoded(STORED_HASH).expect("valid hash"),
        profile: Profile {
            display_name: DisplayName::from(&username),
            avatar_url: None,
            bio: None,
            links: SocialLinks::default(),
        },
        counters: EngagementCounters::default(),
        is_active: active,
        created_at: at,
        updated_at: at,
    })
}

fn candidate(display_name: Option<&str>) -> NewAccount {
    NewAccount {
        username: Username::new("alice").expect("valid username"),
        email: Email::new("a@x.com").expect("valid email"),
        password: RawPassword::for_storage("secret1").expect("valid password"),
        display_name: display_name.map(|name| DisplayName::new(name).expect("valid name")),
        avatar_url: None,
        bio: None,
        links: SocialLinks::default(),
    }
}

fn password(raw: &str) -> RawPassword {
    RawPassword::new(raw).expect("non-empty password")
}

fn make_service(
    store: MockAccountStore,
    hasher: MockPasswordHasher,
) -> AccountService<MockAccountStore, MockPasswordHasher> {
    AccountService::new(Arc::new(store), Arc::new(hasher))
}

#[tokio::test]
async fn register_checks_username_before_email() {
    let mut store = MockAccountStore::new();
    store
        .expect_exists_by_username()
        .times(1)
        .return_once(|_| Ok(true));
    store.expect_exists_by_email().never();
    store.expect_insert().never();
    let mut hasher = MockPasswordHasher::new();
    hasher.expect_hash().never();

    let error = make_service(store, hasher)
        .register(candidate(None))
        .await
        .expect_err("username taken");
    assert_eq!(error.code(), ErrorCode::UsernameExists);
}

#[tokio::test]
async fn register_rejects_taken_email() {
    let mut store = MockAccountStore::new();
    store
        .expect_exists_by_username()
        .return_once(|_| Ok(false));
    store.expect_exists_by_email().return_once(|_| Ok(true));
    store.expect_insert().never();

    let error = make_service(store, MockPasswordHasher::new())
        .register(candidate(None))
        .await
        .expect_err("email taken");
    assert_eq!(error.code(), ErrorCode::EmailExists);
}

#[rstest]
#[case(None, "alice")]
#[case(Some("Alice Liddell"), "Alice Liddell")]
#[tokio::test]
async fn register_hashes_password_and_normalises_state(
    #[case] display_name: Option<&'static str>,
    #[case] expected_name: &'static str,
) {
    let mut store = MockAccountStore::new();
    store
        .expect_exists_by_username()
        .return_once(|_| Ok(false));
    store.expect_exists_by_email().return_once(|_| Ok(false));
    store
        .expect_insert()
        .withf(move |draft| {
            draft.password_hash.as_str() == STORED_HASH
                && draft.profile.display_name.as_str() == expected_name
                && draft.is_active
                && draft.counters == EngagementCounters::default()
        })
        .times(1)
        .return_once(|_| Ok(stored_account(1, true)));
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_hash()
        .withf(|raw| raw.expose() == "secret1")
        .times(1)
        .return_once(|_| Ok(PasswordHash::from_encoded(STORED_HASH).expect("valid hash")));

    let account = make_service(store, hasher)
        .register(candidate(display_name))
        .await
        .expect("registration succeeds");
    assert_eq!(account.id(), id(1));
    assert!(account.is_active());
}

#[rstest]
#[case(UniqueField::Username, ErrorCode::UsernameExists)]
#[case(UniqueField::Email, ErrorCode::EmailExists)]
#[tokio::test]
async fn register_reports_lost_uniqueness_race(
    #[case] field: UniqueField,
    #[case] expected: ErrorCode,
) {
    let mut store = MockAccountStore::new();
    store
        .expect_exists_by_username()
        .return_once(|_| Ok(false));
    store.expect_exists_by_email().return_once(|_| Ok(false));
    store
        .expect_insert()
        .return_once(move |_| Err(AccountStoreError::conflict(field)));
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_hash()
        .return_once(|_| Ok(PasswordHash::from_encoded(STORED_HASH).expect("valid hash")));

    let error = make_service(store, hasher)
        .register(candidate(None))
        .await
        .expect_err("conflict surfaces");
    assert_eq!(error.code(), expected);
}

#[tokio::test]
async fn login_reports_unknown_identifier() {
    let mut store = MockAccountStore::new();
    store
        .expect_find_by_username_or_email()
        .withf(|identifier| identifier == "ghost")
        .return_once(|_| Ok(None));

    let error = make_service(store, MockPasswordHasher::new())
        .login("ghost", &password("secret1"))
        .await
        .expect_err("unknown account");
    assert_eq!(error.code(), ErrorCode::UserNotFound);
}

#[rstest]
#[case("secret1")]
#[case("wrong")]
#[tokio::test]
async fn login_never_verifies_disabled_accounts(#[case] attempt: &str) {
    let mut store = MockAccountStore::new();
    store
        .expect_find_by_username_or_email()
        .return_once(|_| Ok(Some(stored_account(1, false))));
    let mut hasher = MockPasswordHasher::new();
    hasher.expect_verify().never();

    let error = make_service(store, hasher)
        .login("alice", &password(attempt))
        .await
        .expect_err("disabled account");
    assert_eq!(error.code(), ErrorCode::UserDisabled);
}

#[rstest]
#[case(true, None)]
#[case(false, Some(ErrorCode::PasswordError))]
#[tokio::test]
async fn login_verifies_password_of_active_accounts(
    #[case] verified: bool,
    #[case] expected: Option<ErrorCode>,
) {
    let mut store = MockAccountStore::new();
    store
        .expect_find_by_username_or_email()
        .return_once(|_| Ok(Some(stored_account(1, true))));
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_verify()
        .withf(|_, hash| hash.as_str() == STORED_HASH)
        .times(1)
        .return_once(move |_, _| Ok(verified));

    let result = make_service(store, hasher)
        .login("a@x.com", &password("secret1"))
        .await;
    assert_eq!(result.err().map(|err| err.code()), expected);
}

#[tokio::test]
async fn malformed_stored_hash_is_internal() {
    let mut store = MockAccountStore::new();
    store
        .expect_find_by_username_or_email()
        .return_once(|_| Ok(Some(stored_account(1, true))));
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_verify()
        .return_once(|_, _| Err(PasswordHashError::malformed("not a PHC string")));

    let error = make_service(store, hasher)
        .login("alice", &password("secret1"))
        .await
        .expect_err("hash failure");
    assert_eq!(error.code(), ErrorCode::InternalError);
}

#[tokio::test]
async fn change_password_with_wrong_old_password_leaves_hash() {
    let mut store = MockAccountStore::new();
    store
        .expect_find_by_id()
        .return_once(|_| Ok(Some(stored_account(1, true))));
    store.expect_replace_password_hash().never();
    let mut hasher = MockPasswordHasher::new();
    hasher.expect_verify().return_once(|_, _| Ok(false));
    hasher.expect_hash().never();

    let error = make_service(store, hasher)
        .change_password(id(1), &password("nope"), &password("fresh-secret"))
        .await
        .expect_err("old password mismatch");
    assert_eq!(error.code(), ErrorCode::PasswordError);
}

#[rstest]
#[case(true, None)]
#[case(false, Some(ErrorCode::PasswordError))]
#[tokio::test]
async fn change_password_swaps_verified_hash(
    #[case] swapped: bool,
    #[case] expected: Option<ErrorCode>,
) {
    let mut store = MockAccountStore::new();
    store
        .expect_find_by_id()
        .return_once(|_| Ok(Some(stored_account(1, true))));
    store
        .expect_replace_password_hash()
        .withf(|_, current, replacement| {
            current.as_str() == STORED_HASH && replacement.as_str() == "$argon2id$new"
        })
        .times(1)
        .return_once(move |_, _, _| Ok(swapped));
    let mut hasher = MockPasswordHasher::new();
    hasher.expect_verify().return_once(|_, _| Ok(true));
    hasher
        .expect_hash()
        .return_once(|_| Ok(PasswordHash::from_encoded("$argon2id$new").expect("valid hash")));

    let result = make_service(store, hasher)
        .change_password(id(1), &password("secret1"), &password("fresh-secret"))
        .await;
    assert_eq!(result.err().map(|err| err.code()), expected);
}

#[tokio::test]
async fn update_profile_of_unknown_account_fails() {
    let mut store = MockAccountStore::new();
    store.expect_find_by_id().return_once(|_| Ok(None));
    store.expect_update().never();

    let error = make_service(store, MockPasswordHasher::new())
        .update_profile(id(9), ProfilePatch::default())
        .await
        .expect_err("missing account");
    assert_eq!(error.code(), ErrorCode::UserNotFound);
}

#[tokio::test]
async fn update_profile_merges_patch_and_keeps_identity() {
    let mut store = MockAccountStore::new();
    store
        .expect_find_by_id()
        .return_once(|_| Ok(Some(stored_account(1, true))));
    store
        .expect_update()
        .withf(|account| {
            account.username().as_str() == "alice"
                && account.email().as_str() == "a@x.com"
                && account.profile().bio.as_deref() == Some("hi")
                && account.profile().display_name.as_str() == "alice"
        })
        .times(1)
        .returning(|account| Ok(Some(account.clone())));

    let patch = ProfilePatch {
        bio: Some("hi".into()),
        ..ProfilePatch::default()
    };
    let account = make_service(store, MockPasswordHasher::new())
        .update_profile(id(1), patch)
        .await
        .expect("update succeeds");
    assert_eq!(account.profile().bio.as_deref(), Some("hi"));
}

#[rstest]
#[case(false)]
#[case(true)]
#[tokio::test]
async fn set_active_writes_only_the_flag(#[case] active: bool) {
    let mut store = MockAccountStore::new();
    store.expect_find_by_id().never();
    store.expect_update().never();
    store
        .expect_set_active()
        .withf(move |account_id, flag| account_id.get() == 1 && *flag == active)
        .times(1)
        .return_once(|_, _| Ok(true));

    make_service(store, MockPasswordHasher::new())
        .set_active(id(1), active)
        .await
        .expect("activation toggles");
}

#[tokio::test]
async fn set_active_on_unknown_account_fails() {
    let mut store = MockAccountStore::new();
    store.expect_set_active().return_once(|_, _| Ok(false));

    let error = make_service(store, MockPasswordHasher::new())
        .set_active(id(5), false)
        .await
        .expect_err("missing account");
    assert_eq!(error.code(), ErrorCode::UserNotFound);
}

#[tokio::test]
async fn counters_delegate_without_existence_check() {
    let mut store = MockAccountStore::new();
    store.expect_find_by_id().never();
    store.expect_increment_view().times(1).return_once(|_| Ok(()));
    store.expect_increment_like().times(1).return_once(|_| Ok(()));
    store.expect_decrement_like().times(1).return_once(|_| Ok(()));
    let service = make_service(store, MockPasswordHasher::new());

    service.increment_view_count(id(42)).await.expect("view");
    service.increment_like_count(id(42)).await.expect("like");
    service.decrement_like_count(id(42)).await.expect("unlike");
}

#[rstest]
#[case(true)]
#[case(false)]
#[tokio::test]
async fn update_stats_ignores_unknown_accounts(#[case] found: bool) {
    let counters = EngagementCounters {
        note_count: 4,
        view_count: 90,
        like_count: 7,
    };
    let mut store = MockAccountStore::new();
    store.expect_find_by_id().never();
    store
        .expect_overwrite_counters()
        .withf(move |account_id, written| account_id.get() == 3 && *written == counters)
        .times(1)
        .return_once(move |_, _| Ok(found));

    make_service(store, MockPasswordHasher::new())
        .update_stats(id(3), counters)
        .await
        .expect("overwrite is a no-op for unknown ids");
}

#[rstest]
#[case(AccountStoreError::connection("refused"))]
#[case(AccountStoreError::query("boom"))]
#[tokio::test]
async fn store_failures_collapse_to_internal(#[case] failure: AccountStoreError) {
    let mut store = MockAccountStore::new();
    store.expect_list_active().return_once(move || Err(failure));

    let error = make_service(store, MockPasswordHasher::new())
        .list_active_accounts()
        .await
        .expect_err("store failure");
    assert_eq!(error.code(), ErrorCode::InternalError);
}

#[rstest]
#[case(true, false)]
#[case(false, true)]
#[tokio::test]
async fn availability_negates_existence(#[case] exists: bool, #[case] available: bool) {
    let mut store = MockAccountStore::new();
    store
        .expect_exists_by_username()
        .return_once(move |_| Ok(exists));
    store.expect_exists_by_email().return_once(move |_| Ok(exists));
    let service = make_service(store, MockPasswordHasher::new());

    let username = Username::new("alice").expect("valid username");
    let email = Email::new("a@x.com").expect("valid email");
    assert_eq!(
        service.is_username_available(&username).await.expect("check"),
        available
    );
    assert_eq!(service.is_email_available(&email).await.expect("check"), available);
}

#[tokio::test]
async fn find_by_username_reports_missing_account() {
    let mut store = MockAccountStore::new();
    store.expect_find_by_username().return_once(|_| Ok(None));

    let username = Username::new("nobody").expect("valid username");
    let error = make_service(store, MockPasswordHasher::new())
        .find_by_username(&username)
        .await
        .expect_err("missing account");
    assert_eq!(error.code(), ErrorCode::UserNotFound);
}
