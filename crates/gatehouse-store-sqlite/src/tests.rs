//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::Arc;

use chrono::{Duration, Utc};
use gatehouse_core::{
  company::{Company, NewCompany},
  directory::{Directory, DirectoryError as _},
  provision::{ProvisioningPolicy, UserProvisioningService},
  session::NewSession,
  user::{Creator, NewUser, ProfilePatch},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory().await.expect("in-memory store")
}

async fn seed_company(s: &SqliteStore, name: &str, domains: &[&str]) -> Company {
  s.create_company(NewCompany {
    name:             name.to_string(),
    domains:          domains.iter().map(|d| d.to_string()).collect(),
    model_preference: None,
  })
  .await
  .unwrap()
}

fn new_user(email: &str, subject: Option<&str>, company_id: Uuid) -> NewUser {
  NewUser {
    email: email.to_string(),
    first_name: "Alice".to_string(),
    last_name: "Liddell".to_string(),
    external_subject: subject.map(str::to_string),
    company_id,
    avatar_url: Some("https://example.com/alice.png".to_string()),
    display_name: Some("Alice Liddell".to_string()),
    created_by: Creator::System,
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_fetch_user_by_every_key() {
  let s = store().await;
  let company = seed_company(&s, "Acme", &["acme.com"]).await;

  let user = s
    .create_user(new_user("alice@acme.com", Some("accounts.google.com:1"), company.company_id))
    .await
    .unwrap();

  let by_id = s.user_by_id(user.user_id).await.unwrap().unwrap();
  assert_eq!(by_id.email, "alice@acme.com");
  assert_eq!(by_id.company_id, company.company_id);
  assert_eq!(by_id.created_by, Creator::System);
  assert_eq!(by_id.avatar_url.as_deref(), Some("https://example.com/alice.png"));

  let by_subject = s
    .user_by_subject("accounts.google.com:1")
    .await
    .unwrap()
    .unwrap();
  assert_eq!(by_subject.user_id, user.user_id);

  let by_email = s.user_by_email("alice@acme.com").await.unwrap().unwrap();
  assert_eq!(by_email.user_id, user.user_id);
}

#[tokio::test]
async fn missing_user_returns_none() {
  let s = store().await;
  assert!(s.user_by_id(Uuid::new_v4()).await.unwrap().is_none());
  assert!(s.user_by_subject("accounts.google.com:ghost").await.unwrap().is_none());
  assert!(s.user_by_email("ghost@acme.com").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_email_is_a_unique_violation() {
  let s = store().await;
  let company = seed_company(&s, "Acme", &["acme.com"]).await;

  s.create_user(new_user("alice@acme.com", Some("accounts.google.com:1"), company.company_id))
    .await
    .unwrap();
  let err = s
    .create_user(new_user("alice@acme.com", Some("accounts.google.com:2"), company.company_id))
    .await
    .unwrap_err();

  assert!(err.is_unique_violation());
}

#[tokio::test]
async fn duplicate_subject_is_a_unique_violation() {
  let s = store().await;
  let company = seed_company(&s, "Acme", &["acme.com"]).await;

  s.create_user(new_user("alice@acme.com", Some("accounts.google.com:1"), company.company_id))
    .await
    .unwrap();
  let err = s
    .create_user(new_user("alice2@acme.com", Some("accounts.google.com:1"), company.company_id))
    .await
    .unwrap_err();

  assert!(err.is_unique_violation());
}

#[tokio::test]
async fn foreign_key_failure_is_not_a_unique_violation() {
  let s = store().await;

  let err = s
    .create_user(new_user("alice@acme.com", None, Uuid::new_v4()))
    .await
    .unwrap_err();

  assert!(!err.is_unique_violation());
}

#[tokio::test]
async fn profile_patch_leaves_unset_fields_untouched() {
  let s = store().await;
  let company = seed_company(&s, "Acme", &["acme.com"]).await;
  let user = s
    .create_user(new_user("alice@acme.com", Some("accounts.google.com:1"), company.company_id))
    .await
    .unwrap();

  s.update_user_profile(
    user.user_id,
    ProfilePatch {
      last_name: Some("Kingsleigh".to_string()),
      ..ProfilePatch::default()
    },
  )
  .await
  .unwrap();

  let updated = s.user_by_id(user.user_id).await.unwrap().unwrap();
  assert_eq!(updated.last_name, "Kingsleigh");
  assert_eq!(updated.first_name, "Alice");
  assert_eq!(updated.email, "alice@acme.com");
  assert_eq!(updated.avatar_url.as_deref(), Some("https://example.com/alice.png"));
}

// ─── Companies ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn company_is_found_by_any_of_its_domains() {
  let s = store().await;
  let company = seed_company(&s, "Acme", &["acme.com", "acme.dev"]).await;

  let by_com = s.company_by_domain("acme.com").await.unwrap().unwrap();
  let by_dev = s.company_by_domain("acme.dev").await.unwrap().unwrap();

  assert_eq!(by_com.company_id, company.company_id);
  assert_eq!(by_dev.company_id, company.company_id);
  assert_eq!(by_com.domains, vec!["acme.com", "acme.dev"]);
}

#[tokio::test]
async fn unknown_domain_returns_none() {
  let s = store().await;
  seed_company(&s, "Acme", &["acme.com"]).await;
  assert!(s.company_by_domain("beta.com").await.unwrap().is_none());
}

#[tokio::test]
async fn claiming_a_taken_domain_rolls_the_whole_company_back() {
  let s = store().await;
  seed_company(&s, "Acme", &["acme.com"]).await;

  let err = s
    .create_company(NewCompany {
      name:             "Beta".to_string(),
      domains:          vec!["beta.com".to_string(), "acme.com".to_string()],
      model_preference: None,
    })
    .await
    .unwrap_err();

  assert!(err.is_unique_violation());
  // The transaction rolled back; the unconflicted domain was not claimed.
  assert!(s.company_by_domain("beta.com").await.unwrap().is_none());
}

// ─── Sessions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn session_roundtrip_and_touch() {
  let s = store().await;
  let company = seed_company(&s, "Acme", &["acme.com"]).await;
  let user = s
    .create_user(new_user("alice@acme.com", Some("accounts.google.com:1"), company.company_id))
    .await
    .unwrap();

  let session = s
    .create_session(NewSession {
      user_id:    user.user_id,
      expires_at: Utc::now() + Duration::days(30),
      client_ip:  Some("203.0.113.7".to_string()),
      user_agent: Some("curl/8".to_string()),
    })
    .await
    .unwrap();

  let fetched = s.session_by_id(session.session_id).await.unwrap().unwrap();
  assert_eq!(fetched.user_id, user.user_id);
  assert_eq!(fetched.client_ip.as_deref(), Some("203.0.113.7"));

  let listed = s.sessions_for_user(user.user_id).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].session_id, session.session_id);

  let later = Utc::now() + Duration::minutes(5);
  s.touch_session(session.session_id, later).await.unwrap();
  let touched = s.session_by_id(session.session_id).await.unwrap().unwrap();
  assert_eq!(touched.last_accessed_at, later);
}

#[tokio::test]
async fn missing_session_returns_none() {
  let s = store().await;
  assert!(s.session_by_id(Uuid::new_v4()).await.unwrap().is_none());
}

// ─── Provisioning over the real constraints ──────────────────────────────────

#[tokio::test]
async fn provisioning_creates_a_user_against_sqlite() {
  let s = Arc::new(store().await);
  let company = seed_company(&s, "Acme", &["acme.com"]).await;

  let svc = UserProvisioningService::new(s.clone(), ProvisioningPolicy::default());
  let identity = test_identity("alice@acme.com");

  let user = svc.provision(&identity).await.unwrap();
  assert_eq!(user.company_id, company.company_id);

  let again = svc.provision(&identity).await.unwrap();
  assert_eq!(again.user_id, user.user_id);
}

#[tokio::test]
async fn concurrent_first_logins_create_exactly_one_user() {
  let s = Arc::new(store().await);
  seed_company(&s, "Acme", &["acme.com"]).await;

  let svc = Arc::new(UserProvisioningService::new(
    s.clone(),
    ProvisioningPolicy::default(),
  ));
  let identity = test_identity("alice@acme.com");

  let (a, b) = tokio::join!(
    {
      let svc = svc.clone();
      let identity = identity.clone();
      async move { svc.provision(&identity).await }
    },
    {
      let svc = svc.clone();
      let identity = identity.clone();
      async move { svc.provision(&identity).await }
    },
  );

  let a = a.unwrap();
  let b = b.unwrap();
  // Whichever call lost the race re-fetched the winner's row.
  assert_eq!(a.user_id, b.user_id);

  let winner = s
    .user_by_subject(&identity.subject)
    .await
    .unwrap()
    .expect("provisioned user");
  assert_eq!(winner.user_id, a.user_id);
}

fn test_identity(email: &str) -> gatehouse_core::identity::Identity {
  let now = Utc::now();
  gatehouse_core::identity::Identity {
    email:        email.to_string(),
    subject:      format!("accounts.google.com:{email}"),
    display_name: Some("Alice Liddell".to_string()),
    avatar_url:   None,
    audience:     "/projects/1234/apps/test".to_string(),
    issuer:       "https://cloud.google.com/iap".to_string(),
    issued_at:    now,
    expires_at:   now + Duration::minutes(10),
  }
}
