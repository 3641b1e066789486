//! First-login provisioning — mapping a verified identity to a user row.

use std::sync::Arc;

use crate::{
  AuthError, Result,
  company::{Company, NewCompany},
  directory::{Directory, DirectoryError},
  identity::{Identity, email_domain},
  user::{Creator, NewUser, ProfilePatch, User},
};

/// The fixed fallback identity used by development auto-seeding.
#[derive(Debug, Clone)]
pub struct AutoSeedUser {
  pub email: String,
  pub name:  String,
}

/// Provisioning behavior toggles, fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct ProvisioningPolicy {
  /// When set, an unknown domain bootstraps a company for the auto-seed
  /// user's own domain instead of failing. Development only.
  pub auto_seed:             Option<AutoSeedUser>,
  /// Backfill profile fields (name, avatar, email) on every login.
  pub sync_profile_on_login: bool,
}

/// Resolves identities to users, creating users (and, in auto-seed mode,
/// companies) on first login.
pub struct UserProvisioningService<D> {
  directory: Arc<D>,
  policy:    ProvisioningPolicy,
}

impl<D> UserProvisioningService<D>
where
  D: Directory,
{
  pub fn new(directory: Arc<D>, policy: ProvisioningPolicy) -> Self {
    Self { directory, policy }
  }

  /// Resolve `identity` to its user row.
  ///
  /// Company creation completes before user creation is attempted; a
  /// failure at either step leaves no dangling half of the pair. A unique
  /// violation from the directory means a concurrent login won the race —
  /// the winner's row is re-fetched and returned.
  pub async fn provision(&self, identity: &Identity) -> Result<User> {
    if let Some(existing) = self
      .directory
      .user_by_subject(&identity.subject)
      .await
      .map_err(AuthError::directory)?
    {
      if self.policy.sync_profile_on_login {
        return self.sync_profile(existing, identity).await;
      }
      return Ok(existing);
    }

    let domain = email_domain(&identity.email).ok_or_else(|| {
      AuthError::BadRequest(format!("email {:?} has no domain", identity.email))
    })?;

    let company = self.resolve_company(&domain).await?;

    let (first_name, last_name) =
      split_display_name(identity.display_name.as_deref());

    let input = NewUser {
      email: identity.email.clone(),
      first_name,
      last_name,
      external_subject: Some(identity.subject.clone()),
      company_id: company.company_id,
      avatar_url: identity.avatar_url.clone(),
      display_name: identity.display_name.clone(),
      created_by: Creator::System,
    };

    match self.directory.create_user(input).await {
      Ok(user) => {
        tracing::info!(user_id = %user.user_id, email = %user.email, "user provisioned");
        Ok(user)
      }
      Err(e) if e.is_unique_violation() => {
        tracing::debug!(subject = %identity.subject, "user creation raced, re-fetching");
        if let Some(user) = self
          .directory
          .user_by_subject(&identity.subject)
          .await
          .map_err(AuthError::directory)?
        {
          return Ok(user);
        }
        self
          .directory
          .user_by_email(&identity.email)
          .await
          .map_err(AuthError::directory)?
          .ok_or_else(|| AuthError::directory(e))
      }
      Err(e) => Err(AuthError::directory(e)),
    }
  }

  async fn resolve_company(&self, domain: &str) -> Result<Company> {
    if let Some(company) = self
      .directory
      .company_by_domain(domain)
      .await
      .map_err(AuthError::directory)?
    {
      return Ok(company);
    }

    let Some(seed) = &self.policy.auto_seed else {
      return Err(AuthError::UnknownDomain { domain: domain.to_string() });
    };

    // Bootstrap short-circuit: the seeded company is named for the seed
    // user's own domain, not the requester's.
    let seed_domain = email_domain(&seed.email).ok_or_else(|| {
      AuthError::Internal(format!("auto-seed email {:?} has no domain", seed.email))
    })?;

    match self
      .directory
      .create_company(NewCompany {
        name:             seed_domain.clone(),
        domains:          vec![seed_domain.clone()],
        model_preference: None,
      })
      .await
    {
      Ok(company) => {
        tracing::info!(company_id = %company.company_id, domain = %seed_domain, "company auto-seeded");
        Ok(company)
      }
      Err(e) if e.is_unique_violation() => self
        .directory
        .company_by_domain(&seed_domain)
        .await
        .map_err(AuthError::directory)?
        .ok_or_else(|| AuthError::directory(e)),
      Err(e) => Err(AuthError::directory(e)),
    }
  }

  async fn sync_profile(&self, user: User, identity: &Identity) -> Result<User> {
    let (first_name, last_name) =
      split_display_name(identity.display_name.as_deref());
    let patch = ProfilePatch {
      email:        Some(identity.email.clone()),
      first_name:   Some(first_name),
      last_name:    Some(last_name),
      avatar_url:   identity.avatar_url.clone(),
      display_name: identity.display_name.clone(),
    };
    self
      .directory
      .update_user_profile(user.user_id, patch)
      .await
      .map_err(AuthError::directory)?;
    self
      .directory
      .user_by_id(user.user_id)
      .await
      .map_err(AuthError::directory)?
      .ok_or_else(|| {
        AuthError::Internal(format!("user {} vanished during profile sync", user.user_id))
      })
  }
}

/// Split a display name on whitespace: first token becomes the first name
/// (default `"User"`), the remainder joined becomes the last name (default
/// empty).
pub fn split_display_name(name: Option<&str>) -> (String, String) {
  let mut words = name.unwrap_or_default().split_whitespace();
  let first = words.next().unwrap_or("User").to_string();
  let last = words.collect::<Vec<_>>().join(" ");
  (first, last)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
