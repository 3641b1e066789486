//! User — the durable application principal an identity resolves to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who created a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Creator {
  /// Created by the provisioning pipeline on first login.
  System,
  /// Created through an administrative path outside this subsystem.
  Admin,
}

/// A provisioned user. Never deleted by this subsystem; profile fields are
/// only backfilled on later logins when the sync policy is on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:          Uuid,
  /// Unique across the directory.
  pub email:            String,
  pub first_name:       String,
  pub last_name:        String,
  /// Unique once set; `None` for users that have never signed in through
  /// the perimeter.
  pub external_subject: Option<String>,
  pub company_id:       Uuid,
  pub avatar_url:       Option<String>,
  pub display_name:     Option<String>,
  pub created_by:       Creator,
  pub created_at:       DateTime<Utc>,
}

/// Input for [`Directory::create_user`](crate::directory::Directory::create_user).
/// The store assigns the id and creation timestamp.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub email:            String,
  pub first_name:       String,
  pub last_name:        String,
  pub external_subject: Option<String>,
  pub company_id:       Uuid,
  pub avatar_url:       Option<String>,
  pub display_name:     Option<String>,
  pub created_by:       Creator,
}

/// Profile fields that may be backfilled on login. A `None` field is left
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
  pub email:        Option<String>,
  pub first_name:   Option<String>,
  pub last_name:    Option<String>,
  pub avatar_url:   Option<String>,
  pub display_name: Option<String>,
}
