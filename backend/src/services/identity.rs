use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::models::SkillLevel;

#[derive(Error, Debug)]
pub enum IdentityError {
    /// The provider refused the request; the message is user-facing.
    #[error("{0}")]
    Rejected(String),

    #[error("Identity provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected identity provider response: {0}")]
    Malformed(String),
}

/// The signed-in user as the identity provider knows them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    /// Profile fields stored with the account at sign-up, when they parse.
    #[serde(
        default,
        rename = "user_metadata",
        deserialize_with = "lenient_metadata",
        skip_serializing_if = "Option::is_none"
    )]
    pub metadata: Option<SignUpMetadata>,
}

fn lenient_metadata<'de, D>(deserializer: D) -> Result<Option<SignUpMetadata>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Profile fields carried alongside a sign-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUpMetadata {
    pub name: String,
    pub city: String,
    pub skill_level: SkillLevel,
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub identity: Identity,
    /// Absent when the provider wants the address confirmed first.
    pub access_token: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> Result<AuthSession, IdentityError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError>;

    /// Resolves an access token; `None` when the token is unknown or expired.
    async fn user(&self, access_token: &str) -> Result<Option<Identity>, IdentityError>;
}

/// GoTrue-compatible HTTP identity provider.
#[derive(Clone)]
pub struct GoTrueClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: &'a SignUpMetadata,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: Identity,
}

impl GoTrueClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("apikey", &self.api_key)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Value, IdentityError> {
        let response = self.request(builder).send().await?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if status.is_success() {
            Ok(body)
        } else {
            Err(IdentityError::Rejected(error_message(&body, status)))
        }
    }
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> Result<AuthSession, IdentityError> {
        let body = self
            .send(
                self.client
                    .post(format!("{}/signup", self.base_url))
                    .json(&SignUpRequest { email, password, data: metadata }),
            )
            .await?;

        // With auto-confirm the provider answers with a session, otherwise
        // with the bare user.
        if body.get("access_token").is_some() {
            let token: TokenResponse = serde_json::from_value(body)
                .map_err(|e| IdentityError::Malformed(e.to_string()))?;
            return Ok(AuthSession {
                identity: token.user,
                access_token: Some(token.access_token),
            });
        }

        let identity: Identity =
            serde_json::from_value(body).map_err(|e| IdentityError::Malformed(e.to_string()))?;
        Ok(AuthSession { identity, access_token: None })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        let body = self
            .send(
                self.client
                    .post(format!("{}/token", self.base_url))
                    .query(&[("grant_type", "password")])
                    .json(&Credentials { email, password }),
            )
            .await?;

        let token: TokenResponse =
            serde_json::from_value(body).map_err(|e| IdentityError::Malformed(e.to_string()))?;
        Ok(AuthSession {
            identity: token.user,
            access_token: Some(token.access_token),
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let response = self
            .request(
                self.client
                    .post(format!("{}/logout", self.base_url))
                    .bearer_auth(access_token),
            )
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body: Value = response.json().await.unwrap_or(Value::Null);
        Err(IdentityError::Rejected(error_message(&body, status)))
    }

    async fn user(&self, access_token: &str) -> Result<Option<Identity>, IdentityError> {
        let response = self
            .request(
                self.client
                    .get(format!("{}/user", self.base_url))
                    .bearer_auth(access_token),
            )
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => {
                let body: Value = response.json().await.unwrap_or(Value::Null);
                Err(IdentityError::Rejected(error_message(&body, status)))
            }
        }
    }
}

/// Picks the human readable part of a provider error body.
fn error_message(body: &Value, status: StatusCode) -> String {
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_owned)
        .unwrap_or_else(|| format!("Identity provider returned {status}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_prefers_msg() {
        let body = json!({"code": 422, "msg": "User already registered", "error": "x"});
        assert_eq!(error_message(&body, StatusCode::UNPROCESSABLE_ENTITY), "User already registered");
    }

    #[test]
    fn test_error_message_oauth_shape() {
        let body = json!({"error": "invalid_grant", "error_description": "Invalid login credentials"});
        assert_eq!(error_message(&body, StatusCode::BAD_REQUEST), "Invalid login credentials");
    }

    #[test]
    fn test_error_message_fallback() {
        assert_eq!(
            error_message(&Value::Null, StatusCode::BAD_GATEWAY),
            "Identity provider returned 502 Bad Gateway"
        );
    }

    #[test]
    fn test_identity_keeps_sign_up_metadata() {
        let id = Uuid::now_v7();
        let user: Identity = serde_json::from_value(json!({
            "id": id,
            "email": "kim@example.com",
            "user_metadata": {"name": "Kim", "city": "Seoul", "skill_level": "pro"}
        }))
        .unwrap();
        assert_eq!(
            user.metadata,
            Some(SignUpMetadata {
                name: "Kim".to_string(),
                city: "Seoul".to_string(),
                skill_level: SkillLevel::Pro,
            })
        );

        // accounts made elsewhere carry other metadata, or none
        let other: Identity =
            serde_json::from_value(json!({"id": id, "user_metadata": {"avatar": "x.png"}})).unwrap();
        assert_eq!(other.metadata, None);
        let bare: Identity = serde_json::from_value(json!({"id": id})).unwrap();
        assert_eq!(bare.metadata, None);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = GoTrueClient::new("https://auth.example/auth/v1/", "key");
        assert_eq!(client.base_url, "https://auth.example/auth/v1");
    }
}
