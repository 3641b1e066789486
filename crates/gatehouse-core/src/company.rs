//! Company — the organization a user belongs to, keyed by email domain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
  pub company_id:       Uuid,
  pub name:             String,
  /// Every domain maps to at most one company; the directory enforces this.
  pub domains:          Vec<String>,
  /// Opaque model preference carried for downstream features. The
  /// authentication pipeline never interprets it.
  pub model_preference: Option<String>,
  pub created_at:       DateTime<Utc>,
}

/// Input for [`Directory::create_company`](crate::directory::Directory::create_company).
#[derive(Debug, Clone)]
pub struct NewCompany {
  pub name:             String,
  pub domains:          Vec<String>,
  pub model_preference: Option<String>,
}
