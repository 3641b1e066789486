//! Expected-audience construction from deployment configuration.

use serde::Deserialize;

/// The deployment identifiers an audience can be built from. All optional;
/// which pair is present decides the audience form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AudienceConfig {
  pub project_number:     Option<String>,
  pub project_id:         Option<String>,
  pub backend_service_id: Option<String>,
}

/// Build the audience string the assertion must be addressed to.
///
/// The backend-service (load-balancer) form takes strict precedence: a
/// deployment behind a load balancer must not validate against the
/// app-engine form just because both identifiers happen to be configured.
/// `None` means the configuration is insufficient; callers surface that as
/// a configuration fault, not a caller error.
pub fn resolve_audience(config: &AudienceConfig) -> Option<String> {
  match (
    &config.project_number,
    &config.backend_service_id,
    &config.project_id,
  ) {
    (Some(number), Some(service), _) => {
      Some(format!("/projects/{number}/global/backendServices/{service}"))
    }
    (Some(number), None, Some(project)) => {
      Some(format!("/projects/{number}/apps/{project}"))
    }
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn config(
    number: Option<&str>,
    project: Option<&str>,
    service: Option<&str>,
  ) -> AudienceConfig {
    AudienceConfig {
      project_number:     number.map(str::to_string),
      project_id:         project.map(str::to_string),
      backend_service_id: service.map(str::to_string),
    }
  }

  #[test]
  fn backend_service_form_wins_even_with_project_id_set() {
    let audience =
      resolve_audience(&config(Some("1234"), Some("my-app"), Some("5678")));
    assert_eq!(
      audience.as_deref(),
      Some("/projects/1234/global/backendServices/5678")
    );
  }

  #[test]
  fn app_engine_form_when_no_backend_service() {
    let audience = resolve_audience(&config(Some("1234"), Some("my-app"), None));
    assert_eq!(audience.as_deref(), Some("/projects/1234/apps/my-app"));
  }

  #[test]
  fn insufficient_configuration_yields_none() {
    assert_eq!(resolve_audience(&config(None, None, None)), None);
    assert_eq!(resolve_audience(&config(Some("1234"), None, None)), None);
    assert_eq!(resolve_audience(&config(None, Some("my-app"), None)), None);
    // A backend service id without a project number is not enough either.
    assert_eq!(resolve_audience(&config(None, None, Some("5678"))), None);
  }
}
