//! End-to-end account behaviour through the service, the in-memory store and
//! the Argon2 hasher, plus a pass over the HTTP surface.

use std::sync::Arc;

use accounts::Trace;
use accounts::domain::ports::{
    AccountCommand, AccountQuery, AccountStore, AccountStoreError, LoginService, PasswordHasher,
};
use accounts::domain::{
    Account, AccountDraft, AccountId, AccountService, DisplayName, Email, EngagementCounters,
    ErrorCode, NewAccount, PasswordHash, ProfilePatch, RawPassword, SocialLinks, Username,
};
use accounts::inbound::http::accounts::configure;
use accounts::inbound::http::state::HttpState;
use accounts::outbound::crypto::{Argon2Params, Argon2PasswordHasher};
use accounts::outbound::memory::InMemoryAccountStore;
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use async_trait::async_trait;
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

type Service = AccountService<InMemoryAccountStore, Argon2PasswordHasher>;

struct Harness {
    store: Arc<InMemoryAccountStore>,
    service: Arc<Service>,
}

fn cheap_hasher() -> Argon2PasswordHasher {
    Argon2PasswordHasher::new(Argon2Params {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    })
    .expect("cheap argon2 params are valid")
}

#[fixture]
fn harness() -> Harness {
    let store = Arc::new(InMemoryAccountStore::new(Arc::new(DefaultClock)));
    let service = Arc::new(AccountService::new(store.clone(), Arc::new(cheap_hasher())));
    Harness { store, service }
}

fn candidate(username: &str, email: &str, password: &str) -> NewAccount {
    NewAccount {
        username: Username::new(username).expect("valid username"),
        email: Email::new(email).expect("valid email"),
        password: RawPassword::new(password).expect("non-empty password"),
        display_name: None,
        avatar_url: None,
        bio: None,
        links: SocialLinks::default(),
    }
}

fn password(raw: &str) -> RawPassword {
    RawPassword::new(raw).expect("non-empty password")
}

fn id(raw: i64) -> AccountId {
    AccountId::new(raw).expect("positive id")
}

#[rstest]
#[tokio::test]
async fn registration_login_and_disable_scenario(harness: Harness) {
    let Harness { service, .. } = harness;

    let alice = service
        .register(candidate("alice", "a@x.com", "secret1"))
        .await
        .expect("first registration succeeds");
    assert_eq!(alice.id().get(), 1);
    assert!(alice.is_active());
    assert_eq!(alice.counters().note_count, 0);
    assert_eq!(alice.profile().display_name.as_str(), "alice");

    let duplicate = service
        .register(candidate("alice", "b@x.com", "x"))
        .await
        .expect_err("username is taken");
    assert_eq!(duplicate.code(), ErrorCode::UsernameExists);

    let logged_in = service
        .login("alice", &password("secret1"))
        .await
        .expect("correct password logs in");
    assert_eq!(logged_in.id().get(), 1);

    let wrong = service
        .login("alice", &password("wrong"))
        .await
        .expect_err("wrong password");
    assert_eq!(wrong.code(), ErrorCode::PasswordError);

    service
        .set_active(id(1), false)
        .await
        .expect("deactivation succeeds");
    let disabled = service
        .login("alice", &password("secret1"))
        .await
        .expect_err("disabled account");
    assert_eq!(disabled.code(), ErrorCode::UserDisabled);
}

#[rstest]
#[tokio::test]
async fn registered_identities_exist_and_block_reuse(harness: Harness) {
    let Harness { store, service } = harness;
    service
        .register(candidate("carol", "c@x.com", "secret1"))
        .await
        .expect("registration succeeds");

    let username = Username::new("carol").expect("valid username");
    let email = Email::new("c@x.com").expect("valid email");
    assert!(store.exists_by_username(&username).await.expect("store ok"));
    assert!(store.exists_by_email(&email).await.expect("store ok"));
    assert!(!service.is_username_available(&username).await.expect("query ok"));
    assert!(!service.is_email_available(&email).await.expect("query ok"));

    let same_email = service
        .register(candidate("caroline", "c@x.com", "secret1"))
        .await
        .expect_err("email is taken");
    assert_eq!(same_email.code(), ErrorCode::EmailExists);
}

#[rstest]
#[case(true)]
#[case(false)]
#[tokio::test]
async fn disabled_accounts_reject_any_password(harness: Harness, #[case] correct: bool) {
    let Harness { service, .. } = harness;
    let account = service
        .register(candidate("dave", "d@x.com", "secret1"))
        .await
        .expect("registration succeeds");
    service
        .set_active(account.id(), false)
        .await
        .expect("deactivation succeeds");

    let attempt = if correct { "secret1" } else { "nope" };
    let err = service
        .login("dave", &password(attempt))
        .await
        .expect_err("disabled account");
    assert_eq!(err.code(), ErrorCode::UserDisabled);
}

#[rstest]
#[tokio::test]
async fn wrong_old_password_keeps_the_stored_hash(harness: Harness) {
    let Harness { service, .. } = harness;
    let account = service
        .register(candidate("erin", "e@x.com", "secret1"))
        .await
        .expect("registration succeeds");

    let err = service
        .change_password(account.id(), &password("guess"), &password("secret2"))
        .await
        .expect_err("old password is wrong");
    assert_eq!(err.code(), ErrorCode::PasswordError);
    service
        .login("erin", &password("secret1"))
        .await
        .expect("original password still works");

    service
        .change_password(account.id(), &password("secret1"), &password("secret2"))
        .await
        .expect("rotation succeeds");
    service
        .login("e@x.com", &password("secret2"))
        .await
        .expect("new password works via email");
}

#[rstest]
#[tokio::test]
async fn like_counter_is_floor_clamped(harness: Harness) {
    let Harness { service, .. } = harness;
    let account = service
        .register(candidate("frank", "f@x.com", "secret1"))
        .await
        .expect("registration succeeds");

    service
        .decrement_like_count(account.id())
        .await
        .expect("decrement succeeds");
    let after_floor = service.find_account(account.id()).await.expect("exists");
    assert_eq!(after_floor.counters().like_count, 0);

    service
        .increment_like_count(account.id())
        .await
        .expect("increment succeeds");
    service
        .decrement_like_count(account.id())
        .await
        .expect("decrement succeeds");
    let round_trip = service.find_account(account.id()).await.expect("exists");
    assert_eq!(round_trip.counters().like_count, 0);

    service
        .increment_like_count(id(999))
        .await
        .expect("unknown ids are ignored");
}

#[rstest]
#[tokio::test]
async fn profile_patch_leaves_identity_alone(harness: Harness) {
    let Harness { service, .. } = harness;
    let account = service
        .register(candidate("grace", "g@x.com", "secret1"))
        .await
        .expect("registration succeeds");

    let updated = service
        .update_profile(
            account.id(),
            ProfilePatch {
                display_name: Some(DisplayName::new("Grace H").expect("valid name")),
                bio: Some("compilers".to_owned()),
                ..ProfilePatch::default()
            },
        )
        .await
        .expect("patch applies");

    assert_eq!(updated.username().as_str(), "grace");
    assert_eq!(updated.email().as_str(), "g@x.com");
    assert_eq!(updated.profile().display_name.as_str(), "Grace H");
    assert_eq!(updated.profile().bio.as_deref(), Some("compilers"));
}

/// Store that lets an administrator deactivate the account between the
/// service's read and its profile write.
struct DeactivateAfterRead {
    inner: InMemoryAccountStore,
}

#[async_trait]
impl AccountStore for DeactivateAfterRead {
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountStoreError> {
        let snapshot = self.inner.find_by_id(id).await?;
        self.inner.set_active(id, false).await?;
        Ok(snapshot)
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<Account>, AccountStoreError> {
        self.inner.find_by_username(username).await
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, AccountStoreError> {
        self.inner.find_by_email(email).await
    }

    async fn find_by_username_or_email(
        &self,
        identifier: &str,
    ) -> Result<Option<Account>, AccountStoreError> {
        self.inner.find_by_username_or_email(identifier).await
    }

    async fn exists_by_username(&self, username: &Username) -> Result<bool, AccountStoreError> {
        self.inner.exists_by_username(username).await
    }

    async fn exists_by_email(&self, email: &Email) -> Result<bool, AccountStoreError> {
        self.inner.exists_by_email(email).await
    }

    async fn insert(&self, draft: AccountDraft) -> Result<Account, AccountStoreError> {
        self.inner.insert(draft).await
    }

    async fn update(&self, account: &Account) -> Result<Option<Account>, AccountStoreError> {
        self.inner.update(account).await
    }

    async fn set_active(&self, id: AccountId, active: bool) -> Result<bool, AccountStoreError> {
        self.inner.set_active(id, active).await
    }

    async fn replace_password_hash(
        &self,
        id: AccountId,
        expected: &PasswordHash,
        replacement: &PasswordHash,
    ) -> Result<bool, AccountStoreError> {
        self.inner
            .replace_password_hash(id, expected, replacement)
            .await
    }

    async fn overwrite_counters(
        &self,
        id: AccountId,
        counters: EngagementCounters,
    ) -> Result<bool, AccountStoreError> {
        self.inner.overwrite_counters(id, counters).await
    }

    async fn increment_view(&self, id: AccountId) -> Result<(), AccountStoreError> {
        self.inner.increment_view(id).await
    }

    async fn increment_like(&self, id: AccountId) -> Result<(), AccountStoreError> {
        self.inner.increment_like(id).await
    }

    async fn decrement_like(&self, id: AccountId) -> Result<(), AccountStoreError> {
        self.inner.decrement_like(id).await
    }

    async fn list_active(&self) -> Result<Vec<Account>, AccountStoreError> {
        self.inner.list_active().await
    }
}

#[rstest]
#[tokio::test]
async fn profile_update_keeps_a_concurrent_deactivation() {
    let store = Arc::new(DeactivateAfterRead {
        inner: InMemoryAccountStore::new(Arc::new(DefaultClock)),
    });
    let service = AccountService::new(store, Arc::new(cheap_hasher()));
    let account = service
        .register(candidate("heidi", "h@x.com", "secret1"))
        .await
        .expect("registration succeeds");

    let updated = service
        .update_profile(
            account.id(),
            ProfilePatch {
                bio: Some("moderated".to_owned()),
                ..ProfilePatch::default()
            },
        )
        .await
        .expect("patch applies");

    assert!(!updated.is_active());
    assert_eq!(updated.profile().bio.as_deref(), Some("moderated"));
    let err = service
        .login("heidi", &password("secret1"))
        .await
        .expect_err("deactivation survives the profile write");
    assert_eq!(err.code(), ErrorCode::UserDisabled);
}

#[rstest]
#[tokio::test]
async fn argon2_verifies_only_the_original_password() {
    let hasher = cheap_hasher();
    let hash = hasher.hash(&password("secret1")).expect("hashing succeeds");
    assert!(hasher.verify(&password("secret1"), &hash).expect("verify ok"));
    assert!(!hasher.verify(&password("secret1x"), &hash).expect("verify ok"));
}

#[rstest]
#[actix_web::test]
async fn http_surface_round_trip(harness: Harness) {
    let state = HttpState::from_service(harness.service);
    let app = actix_test::init_service(
        App::new()
            .wrap(Trace)
            .app_data(web::Data::new(state))
            .configure(configure),
    )
    .await;

    let req = actix_test::TestRequest::post()
        .uri("/api/users/register")
        .set_json(json!({"username": "alice", "email": "a@x.com", "password": "secret1"}))
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = actix_test::read_body_json(res).await;
    assert_eq!(created["id"], 1);
    assert!(created.get("passwordHash").is_none());

    let req = actix_test::TestRequest::post()
        .uri("/api/users/register")
        .set_json(json!({"username": "alice", "email": "b@x.com", "password": "secret1"}))
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["code"], "U002");

    let req = actix_test::TestRequest::put()
        .uri("/api/users/1/deactivate")
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let req = actix_test::TestRequest::post()
        .uri("/api/users/login")
        .set_json(json!({"username": "alice", "password": "secret1"}))
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["code"], "U005");

    let req = actix_test::TestRequest::get()
        .uri("/api/users/check/username/alice")
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({ "available": false }));

    let req = actix_test::TestRequest::get().uri("/api/users/active").to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!([]));
}
