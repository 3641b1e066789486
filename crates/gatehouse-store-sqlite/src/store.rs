//! [`SqliteStore`] — the SQLite implementation of [`Directory`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use gatehouse_core::{
  company::{Company, NewCompany},
  directory::Directory,
  session::{NewSession, Session},
  user::{NewUser, ProfilePatch, User},
};

use crate::{
  Error, Result,
  encode::{
    RawCompany, RawSession, RawUser, encode_creator, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

const USER_COLUMNS: &str = "user_id, email, first_name, last_name, \
                            external_subject, company_id, avatar_url, \
                            display_name, created_by, created_at";

const SESSION_COLUMNS: &str = "session_id, user_id, expires_at, client_ip, \
                               user_agent, created_at, last_accessed_at";

fn map_raw_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    user_id:          row.get(0)?,
    email:            row.get(1)?,
    first_name:       row.get(2)?,
    last_name:        row.get(3)?,
    external_subject: row.get(4)?,
    company_id:       row.get(5)?,
    avatar_url:       row.get(6)?,
    display_name:     row.get(7)?,
    created_by:       row.get(8)?,
    created_at:       row.get(9)?,
  })
}

fn map_raw_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSession> {
  Ok(RawSession {
    session_id:       row.get(0)?,
    user_id:          row.get(1)?,
    expires_at:       row.get(2)?,
    client_ip:        row.get(3)?,
    user_agent:       row.get(4)?,
    created_at:       row.get(5)?,
    last_accessed_at: row.get(6)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Gatehouse directory backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fetch a single user by an exact match on one column.
  async fn user_where(
    &self,
    clause: &'static str,
    value: String,
  ) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE {clause} = ?1"),
              rusqlite::params![value],
              map_raw_user,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }
}

// ─── Directory impl ──────────────────────────────────────────────────────────

impl Directory for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn user_by_id(&self, id: Uuid) -> Result<Option<User>> {
    self.user_where("user_id", encode_uuid(id)).await
  }

  async fn user_by_subject(&self, subject: &str) -> Result<Option<User>> {
    self.user_where("external_subject", subject.to_string()).await
  }

  async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
    self.user_where("email", email.to_string()).await
  }

  async fn create_user(&self, input: NewUser) -> Result<User> {
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

    let id_str         = encode_uuid(user.user_id);
    let email          = user.email.clone();
    let first_name     = user.first_name.clone();
    let last_name      = user.last_name.clone();
    let subject        = user.external_subject.clone();
    let company_id_str = encode_uuid(user.company_id);
    let avatar_url     = user.avatar_url.clone();
    let display_name   = user.display_name.clone();
    let created_by_str = encode_creator(user.created_by).to_owned();
    let created_at_str = encode_dt(user.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (
             user_id, email, first_name, last_name, external_subject,
             company_id, avatar_url, display_name, created_by, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str,
            email,
            first_name,
            last_name,
            subject,
            company_id_str,
            avatar_url,
            display_name,
            created_by_str,
            created_at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(user)
  }

  async fn update_user_profile(
    &self,
    user_id: Uuid,
    patch: ProfilePatch,
  ) -> Result<()> {
    let id_str = encode_uuid(user_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE users SET
             email        = COALESCE(?2, email),
             first_name   = COALESCE(?3, first_name),
             last_name    = COALESCE(?4, last_name),
             avatar_url   = COALESCE(?5, avatar_url),
             display_name = COALESCE(?6, display_name)
           WHERE user_id = ?1",
          rusqlite::params![
            id_str,
            patch.email,
            patch.first_name,
            patch.last_name,
            patch.avatar_url,
            patch.display_name,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Companies ─────────────────────────────────────────────────────────────

  async fn company_by_domain(&self, domain: &str) -> Result<Option<Company>> {
    let domain = domain.to_string();

    let found: Option<(RawCompany, Vec<String>)> = self
      .conn
      .call(move |conn| {
        let raw: Option<RawCompany> = conn
          .query_row(
            "SELECT c.company_id, c.name, c.model_preference, c.created_at
             FROM companies c
             JOIN company_domains d ON d.company_id = c.company_id
             WHERE d.domain = ?1",
            rusqlite::params![domain],
            |row| {
              Ok(RawCompany {
                company_id:       row.get(0)?,
                name:             row.get(1)?,
                model_preference: row.get(2)?,
                created_at:       row.get(3)?,
              })
            },
          )
          .optional()?;

        let Some(raw) = raw else { return Ok(None) };

        let mut stmt = conn.prepare(
          "SELECT domain FROM company_domains WHERE company_id = ?1 ORDER BY domain",
        )?;
        let domains = stmt
          .query_map(rusqlite::params![raw.company_id], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;

        Ok(Some((raw, domains)))
      })
      .await?;

    found
      .map(|(raw, domains)| raw.into_company(domains))
      .transpose()
  }

  async fn create_company(&self, input: NewCompany) -> Result<Company> {
    let company = Company {
      company_id:       Uuid::new_v4(),
      name:             input.name,
      domains:          input.domains,
      model_preference: input.model_preference,
      created_at:       Utc::now(),
    };

    let id_str         = encode_uuid(company.company_id);
    let name           = company.name.clone();
    let preference     = company.model_preference.clone();
    let created_at_str = encode_dt(company.created_at);
    let domains        = company.domains.clone();

    // Company row and domain claims commit together; a taken domain rolls
    // the whole company back.
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO companies (company_id, name, model_preference, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name, preference, created_at_str],
        )?;
        for domain in &domains {
          tx.execute(
            "INSERT INTO company_domains (domain, company_id) VALUES (?1, ?2)",
            rusqlite::params![domain, id_str],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(company)
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn sessions_for_user(&self, user_id: Uuid) -> Result<Vec<Session>> {
    let id_str = encode_uuid(user_id);

    let raws: Vec<RawSession> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SESSION_COLUMNS} FROM sessions WHERE user_id = ?1"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], map_raw_session)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSession::into_session).collect()
  }

  async fn create_session(&self, input: NewSession) -> Result<Session> {
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

    let id_str         = encode_uuid(session.session_id);
    let user_id_str    = encode_uuid(session.user_id);
    let expires_str    = encode_dt(session.expires_at);
    let client_ip      = session.client_ip.clone();
    let user_agent     = session.user_agent.clone();
    let created_str    = encode_dt(session.created_at);
    let accessed_str   = encode_dt(session.last_accessed_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (
             session_id, user_id, expires_at, client_ip, user_agent,
             created_at, last_accessed_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str,
            user_id_str,
            expires_str,
            client_ip,
            user_agent,
            created_str,
            accessed_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(session)
  }

  async fn session_by_id(&self, session_id: Uuid) -> Result<Option<Session>> {
    let id_str = encode_uuid(session_id);

    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE session_id = ?1"),
              rusqlite::params![id_str],
              map_raw_session,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSession::into_session).transpose()
  }

  async fn touch_session(&self, session_id: Uuid, at: DateTime<Utc>) -> Result<()> {
    let id_str = encode_uuid(session_id);
    let at_str = encode_dt(at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE sessions SET last_accessed_at = ?2 WHERE session_id = ?1",
          rusqlite::params![id_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
