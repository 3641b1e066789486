//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use gatehouse_core::{
  company::Company,
  session::Session,
  user::{Creator, User},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Creator ─────────────────────────────────────────────────────────────────

pub fn encode_creator(c: Creator) -> &'static str {
  match c {
    Creator::System => "system",
    Creator::Admin => "admin",
  }
}

pub fn decode_creator(s: &str) -> Result<Creator> {
  match s {
    "system" => Ok(Creator::System),
    "admin" => Ok(Creator::Admin),
    other => Err(Error::UnknownCreator(other.to_string())),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:          String,
  pub email:            String,
  pub first_name:       String,
  pub last_name:        String,
  pub external_subject: Option<String>,
  pub company_id:       String,
  pub avatar_url:       Option<String>,
  pub display_name:     Option<String>,
  pub created_by:       String,
  pub created_at:       String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:          decode_uuid(&self.user_id)?,
      email:            self.email,
      first_name:       self.first_name,
      last_name:        self.last_name,
      external_subject: self.external_subject,
      company_id:       decode_uuid(&self.company_id)?,
      avatar_url:       self.avatar_url,
      display_name:     self.display_name,
      created_by:       decode_creator(&self.created_by)?,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read from a `companies` row; domains are loaded separately.
pub struct RawCompany {
  pub company_id:       String,
  pub name:             String,
  pub model_preference: Option<String>,
  pub created_at:       String,
}

impl RawCompany {
  pub fn into_company(self, domains: Vec<String>) -> Result<Company> {
    Ok(Company {
      company_id: decode_uuid(&self.company_id)?,
      name: self.name,
      domains,
      model_preference: self.model_preference,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `sessions` row.
pub struct RawSession {
  pub session_id:       String,
  pub user_id:          String,
  pub expires_at:       String,
  pub client_ip:        Option<String>,
  pub user_agent:       Option<String>,
  pub created_at:       String,
  pub last_accessed_at: String,
}

impl RawSession {
  pub fn into_session(self) -> Result<Session> {
    Ok(Session {
      session_id:       decode_uuid(&self.session_id)?,
      user_id:          decode_uuid(&self.user_id)?,
      expires_at:       decode_dt(&self.expires_at)?,
      client_ip:        self.client_ip,
      user_agent:       self.user_agent,
      created_at:       decode_dt(&self.created_at)?,
      last_accessed_at: decode_dt(&self.last_accessed_at)?,
    })
  }
}
