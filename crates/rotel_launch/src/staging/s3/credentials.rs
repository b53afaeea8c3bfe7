//! AWS credential resolution (static keys or the ECS container endpoint)

use crate::environment::EnvStore;
use crate::staging::store::ObjectStoreError;
use serde::Deserialize;

/// ECS task metadata credentials host
const ECS_CREDENTIALS_HOST: &str = "http://169.254.170.2";

/// Resolved AWS credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Where credentials come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` / `AWS_SESSION_TOKEN`
    Static(Credentials),
    /// Container credentials endpoint (ECS task role)
    Container {
        url: String,
        authorization: Option<String>,
    },
    /// No credentials configured; requests are sent unsigned
    Anonymous,
}

/// Body returned by the container credentials endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerCredentials {
    access_key_id: String,
    secret_access_key: String,
    #[serde(default)]
    token: Option<String>,
}

impl CredentialSource {
    /// Pick the credential source from environment variables
    pub fn from_env<E: EnvStore + ?Sized>(env: &E) -> Result<Self, ObjectStoreError> {
        if let (Some(access_key_id), Some(secret_access_key)) = (
            env.get_non_empty("AWS_ACCESS_KEY_ID"),
            env.get_non_empty("AWS_SECRET_ACCESS_KEY"),
        ) {
            return Ok(CredentialSource::Static(Credentials {
                access_key_id,
                secret_access_key,
                session_token: env.get_non_empty("AWS_SESSION_TOKEN"),
            }));
        }

        let url = if let Some(relative) = env.get_non_empty("AWS_CONTAINER_CREDENTIALS_RELATIVE_URI")
        {
            Some(format!("{}{}", ECS_CREDENTIALS_HOST, relative))
        } else {
            env.get_non_empty("AWS_CONTAINER_CREDENTIALS_FULL_URI")
        };

        let Some(url) = url else {
            return Ok(CredentialSource::Anonymous);
        };

        let authorization = match env.get_non_empty("AWS_CONTAINER_AUTHORIZATION_TOKEN") {
            Some(token) => Some(token),
            None => match env.get_non_empty("AWS_CONTAINER_AUTHORIZATION_TOKEN_FILE") {
                Some(path) => Some(
                    std::fs::read_to_string(&path)
                        .map_err(|e| {
                            ObjectStoreError::Credentials(format!(
                                "failed to read authorization token file '{}': {}",
                                path, e
                            ))
                        })?
                        .trim()
                        .to_string(),
                ),
                None => None,
            },
        };

        Ok(CredentialSource::Container { url, authorization })
    }

    /// Resolve to concrete credentials, `None` for anonymous access
    pub async fn resolve(
        &self,
        client: &reqwest::Client,
    ) -> Result<Option<Credentials>, ObjectStoreError> {
        match self {
            CredentialSource::Static(credentials) => Ok(Some(credentials.clone())),
            CredentialSource::Anonymous => Ok(None),
            CredentialSource::Container { url, authorization } => {
                log::debug!("Fetching container credentials from {}", url);
                let mut request = client.get(url);
                if let Some(token) = authorization {
                    request = request.header("authorization", token);
                }

                let response = request.send().await?;
                let status = response.status();
                if !status.is_success() {
                    let message = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "unknown error".to_string());
                    return Err(ObjectStoreError::Credentials(format!(
                        "container endpoint returned status {}: {}",
                        status.as_u16(),
                        message
                    )));
                }

                let body = response.text().await?;
                parse_container_credentials(&body).map(Some)
            }
        }
    }
}

fn parse_container_credentials(body: &str) -> Result<Credentials, ObjectStoreError> {
    let document: ContainerCredentials = serde_json::from_str(body).map_err(|e| {
        ObjectStoreError::Credentials(format!("invalid container credentials document: {}", e))
    })?;
    Ok(Credentials {
        access_key_id: document.access_key_id,
        secret_access_key: document.secret_access_key,
        session_token: document.token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::MemoryEnv;

    #[test]
    fn test_static_credentials() {
        let env = MemoryEnv::new()
            .with_var("AWS_ACCESS_KEY_ID", "AKID")
            .with_var("AWS_SECRET_ACCESS_KEY", "secret")
            .with_var("AWS_SESSION_TOKEN", "token")
            .with_var("AWS_CONTAINER_CREDENTIALS_RELATIVE_URI", "/v2/credentials/x");

        let source = CredentialSource::from_env(&env).unwrap();
        assert_eq!(
            source,
            CredentialSource::Static(Credentials {
                access_key_id: "AKID".to_string(),
                secret_access_key: "secret".to_string(),
                session_token: Some("token".to_string()),
            })
        );
    }

    #[test]
    fn test_ecs_relative_uri() {
        let env = MemoryEnv::new()
            .with_var("AWS_CONTAINER_CREDENTIALS_RELATIVE_URI", "/v2/credentials/abc");

        let source = CredentialSource::from_env(&env).unwrap();
        assert_eq!(
            source,
            CredentialSource::Container {
                url: "http://169.254.170.2/v2/credentials/abc".to_string(),
                authorization: None,
            }
        );
    }

    #[test]
    fn test_full_uri_with_token_file() {
        let dir = tempfile::tempdir().unwrap();
        let token_file = dir.path().join("token");
        std::fs::write(&token_file, "Bearer abc\n").unwrap();

        let env = MemoryEnv::new()
            .with_var("AWS_CONTAINER_CREDENTIALS_FULL_URI", "http://localhost:8080/creds")
            .with_var(
                "AWS_CONTAINER_AUTHORIZATION_TOKEN_FILE",
                token_file.display().to_string(),
            );

        let source = CredentialSource::from_env(&env).unwrap();
        assert_eq!(
            source,
            CredentialSource::Container {
                url: "http://localhost:8080/creds".to_string(),
                authorization: Some("Bearer abc".to_string()),
            }
        );
    }

    #[test]
    fn test_anonymous_without_configuration() {
        let env = MemoryEnv::new().with_var("AWS_ACCESS_KEY_ID", "AKID");
        assert_eq!(
            CredentialSource::from_env(&env).unwrap(),
            CredentialSource::Anonymous
        );
    }

    #[test]
    fn test_parse_container_document() {
        let body = r#"{
            "AccessKeyId": "ASIAEXAMPLE",
            "SecretAccessKey": "secret",
            "Token": "session",
            "Expiration": "2026-10-16T12:00:00Z",
            "RoleArn": "arn:aws:iam::123456789012:role/task"
        }"#;
        let credentials = parse_container_credentials(body).unwrap();
        assert_eq!(credentials.access_key_id, "ASIAEXAMPLE");
        assert_eq!(credentials.secret_access_key, "secret");
        assert_eq!(credentials.session_token.as_deref(), Some("session"));

        let err = parse_container_credentials(r#"{"AccessKeyId": "x"}"#).unwrap_err();
        assert!(matches!(err, ObjectStoreError::Credentials(_)));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let credentials = Credentials {
            access_key_id: "AKID".to_string(),
            secret_access_key: "very-secret".to_string(),
            session_token: Some("token".to_string()),
        };
        let rendered = format!("{:?}", credentials);
        assert!(rendered.contains("AKID"));
        assert!(!rendered.contains("very-secret"));
        assert!(!rendered.contains("token\""));
    }

    #[tokio::test]
    async fn test_resolve_static_and_anonymous() {
        let client = reqwest::Client::new();
        assert!(CredentialSource::Anonymous
            .resolve(&client)
            .await
            .unwrap()
            .is_none());

        let credentials = Credentials {
            access_key_id: "AKID".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: None,
        };
        let resolved = CredentialSource::Static(credentials.clone())
            .resolve(&client)
            .await
            .unwrap();
        assert_eq!(resolved, Some(credentials));
    }
}
