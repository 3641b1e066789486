//! A functional in-memory [`Directory`] used by unit tests.
//!
//! Enforces the same uniqueness rules as a real backend (user email, user
//! external subject, company domain) so provisioning's race-recovery path
//! can be exercised without a database.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  company::{Company, NewCompany},
  directory::{Directory, DirectoryError},
  identity::Identity,
  session::{NewSession, Session},
  user::{NewUser, ProfilePatch, User},
};

#[derive(Debug, Error)]
pub enum MemoryError {
  #[error("unique constraint violated: {0}")]
  Unique(&'static str),
}

impl DirectoryError for MemoryError {
  fn is_unique_violation(&self) -> bool { matches!(self, MemoryError::Unique(_)) }
}

#[derive(Default)]
struct Tables {
  users:     Vec<User>,
  companies: Vec<Company>,
  sessions:  Vec<Session>,
}

#[derive(Default)]
pub struct MemoryDirectory {
  inner: Mutex<Tables>,
}

impl MemoryDirectory {
  pub fn new() -> Self { Self::default() }

  pub async fn insert_company(&self, name: &str, domains: &[&str]) -> Company {
    let company = Company {
      company_id:       Uuid::new_v4(),
      name:             name.to_string(),
      domains:          domains.iter().map(|d| d.to_string()).collect(),
      model_preference: None,
      created_at:       Utc::now(),
    };
    self.inner.lock().unwrap().companies.push(company.clone());
    company
  }

  pub async fn insert_session(&self, user_id: Uuid, expires_at: DateTime<Utc>) -> Session {
    let now = Utc::now();
    let session = Session {
      session_id: Uuid::new_v4(),
      user_id,
      expires_at,
      client_ip: None,
      user_agent: None,
      created_at: now,
      last_accessed_at: now,
    };
    self.inner.lock().unwrap().sessions.push(session.clone());
    session
  }

  pub async fn user_count(&self) -> usize {
    self.inner.lock().unwrap().users.len()
  }

  pub async fn company_count(&self) -> usize {
    self.inner.lock().unwrap().companies.len()
  }
}

impl Directory for MemoryDirectory {
  type Error = MemoryError;

  async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, MemoryError> {
    let t = self.inner.lock().unwrap();
    Ok(t.users.iter().find(|u| u.user_id == id).cloned())
  }

  async fn user_by_subject(&self, subject: &str) -> Result<Option<User>, MemoryError> {
    let t = self.inner.lock().unwrap();
    Ok(
      t.users
        .iter()
        .find(|u| u.external_subject.as_deref() == Some(subject))
        .cloned(),
    )
  }

  async fn user_by_email(&self, email: &str) -> Result<Option<User>, MemoryError> {
    let t = self.inner.lock().unwrap();
    Ok(t.users.iter().find(|u| u.email == email).cloned())
  }

  async fn create_user(&self, input: NewUser) -> Result<User, MemoryError> {
    let mut t = self.inner.lock().unwrap();
    if t.users.iter().any(|u| u.email == input.email) {
      return Err(MemoryError::Unique("users.email"));
    }
    if let Some(subject) = &input.external_subject
      && t.users.iter().any(|u| u.external_subject.as_deref() == Some(subject))
    {
      return Err(MemoryError::Unique("users.external_subject"));
    }
    let user = User {
      user_id:          Uuid::new_v4(),
      email:            input.email,
      first_name:       input.first_name,
      last_name:        input.last_name,
      external_subject: input.external_subject,
      company_id:       input.company_id,
      avatar_url:       input.avatar_url,
      display_name:     input.display_name,
      created_by:       input.created_by,
      created_at:       Utc::now(),
    };
    t.users.push(user.clone());
    Ok(user)
  }

  async fn update_user_profile(
    &self,
    user_id: Uuid,
    patch: ProfilePatch,
  ) -> Result<(), MemoryError> {
    let mut t = self.inner.lock().unwrap();
    if let Some(user) = t.users.iter_mut().find(|u| u.user_id == user_id) {
      if let Some(email) = patch.email {
        user.email = email;
      }
      if let Some(first_name) = patch.first_name {
        user.first_name = first_name;
      }
      if let Some(last_name) = patch.last_name {
        user.last_name = last_name;
      }
      if let Some(avatar_url) = patch.avatar_url {
        user.avatar_url = Some(avatar_url);
      }
      if let Some(display_name) = patch.display_name {
        user.display_name = Some(display_name);
      }
    }
    Ok(())
  }

  async fn company_by_domain(&self, domain: &str) -> Result<Option<Company>, MemoryError> {
    let t = self.inner.lock().unwrap();
    Ok(
      t.companies
        .iter()
        .find(|c| c.domains.iter().any(|d| d == domain))
        .cloned(),
    )
  }

  async fn create_company(&self, input: NewCompany) -> Result<Company, MemoryError> {
    let mut t = self.inner.lock().unwrap();
    for domain in &input.domains {
      if t.companies.iter().any(|c| c.domains.contains(domain)) {
        return Err(MemoryError::Unique("company_domains.domain"));
      }
    }
    let company = Company {
      company_id:       Uuid::new_v4(),
      name:             input.name,
      domains:          input.domains,
      model_preference: input.model_preference,
      created_at:       Utc::now(),
    };
    t.companies.push(company.clone());
    Ok(company)
  }

  async fn sessions_for_user(&self, user_id: Uuid) -> Result<Vec<Session>, MemoryError> {
    let t = self.inner.lock().unwrap();
    Ok(
      t.sessions
        .iter()
        .filter(|s| s.user_id == user_id)
        .cloned()
        .collect(),
    )
  }

  async fn create_session(&self, input: NewSession) -> Result<Session, MemoryError> {
    let now = Utc::now();
    let session = Session {
      session_id:       Uuid::new_v4(),
      user_id:          input.user_id,
      expires_at:       input.expires_at,
      client_ip:        input.client_ip,
      user_agent:       input.user_agent,
      created_at:       now,
      last_accessed_at: now,
    };
    self.inner.lock().unwrap().sessions.push(session.clone());
    Ok(session)
  }

  async fn session_by_id(&self, session_id: Uuid) -> Result<Option<Session>, MemoryError> {
    let t = self.inner.lock().unwrap();
    Ok(t.sessions.iter().find(|s| s.session_id == session_id).cloned())
  }

  async fn touch_session(
    &self,
    session_id: Uuid,
    at: DateTime<Utc>,
  ) -> Result<(), MemoryError> {
    let mut t = self.inner.lock().unwrap();
    if let Some(session) = t.sessions.iter_mut().find(|s| s.session_id == session_id) {
      session.last_accessed_at = at;
    }
    Ok(())
  }
}

/// A verified identity for `email`, shaped like the enforced path produces.
pub fn identity_for(email: &str, display_name: Option<&str>) -> Identity {
  let now = Utc::now();
  Identity {
    email:        email.to_string(),
    subject:      format!("accounts.google.com:{email}"),
    display_name: display_name.map(str::to_string),
    avatar_url:   None,
    audience:     "/projects/1234/apps/test".to_string(),
    issuer:       "https://cloud.google.com/iap".to_string(),
    issued_at:    now,
    expires_at:   now + chrono::Duration::minutes(10),
  }
}
