//! Client for the portal automation bridge
//!
//! The bridge drives the browser and exposes the scraped cards as JSON. This
//! client only knows the bridge's HTTP contract:
//!
//! | call | request | response |
//! |------|---------|----------|
//! | login | `POST /session` `{username, password}` | `{token, user}` |
//! | validate | `GET /session` | 200 or 401 |
//! | goals | `GET /goals` | `[GoalRecord]` |
//! | attributes | `GET /attributes` | `[AttributeRecord]` |
//! | settings | `GET /settings` | `{key: value}` |
//! | stakeholders | `GET /stakeholders` | `[Stakeholder]` |
//! | feed-forward | `GET /feed-forward` | `{section: [card]}` |
//! | submit | `POST /comments` `{comments}` | `{accepted, rejected}` |

use async_trait::async_trait;
use domain::{
    AppraisalPortal, AppraisalSettings, AttributeRecord, Credentials, FeedForwardCard,
    GeneratedComment, GoalRecord, PortalError, PortalResult, Session, Stakeholder,
    StakeholderContext, SubmissionReceipt,
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    comments: &'a [GeneratedComment],
}

#[derive(Clone)]
pub struct HttpPortal {
    base_url: String,
    client: reqwest::Client,
}

impl HttpPortal {
    pub fn new(base_url: &str, timeout: Duration) -> PortalResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortalError::Request(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, session: &Session, path: &str) -> PortalResult<T> {
        debug!("GET {}", path);
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&session.token)
            .send()
            .await
            .map_err(|e| PortalError::Request(e.to_string()))?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> PortalResult<T> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(PortalError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PortalError::Status {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json()
            .await
            .map_err(|e| PortalError::MalformedPayload(e.to_string()))
    }
}

#[async_trait]
impl AppraisalPortal for HttpPortal {
    async fn login(&self, credentials: &Credentials) -> PortalResult<Session> {
        info!("Logging in to the portal as {}", credentials.username);
        let response = self
            .client
            .post(self.url("/session"))
            .json(&LoginRequest {
                username: &credentials.username,
                password: credentials.password.as_deref(),
            })
            .send()
            .await
            .map_err(|e| PortalError::Request(e.to_string()))?;

        let session: Session = Self::decode(response).await?;
        if session.token.trim().is_empty() {
            return Err(PortalError::MalformedPayload("empty session token".into()));
        }
        Ok(session)
    }

    async fn validate_session(&self, session: &Session) -> PortalResult<bool> {
        let response = self
            .client
            .get(self.url("/session"))
            .bearer_auth(&session.token)
            .send()
            .await
            .map_err(|e| PortalError::Request(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(true)
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Ok(false)
        } else {
            Err(PortalError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }

    async fn extract_goals(&self, session: &Session) -> PortalResult<Vec<GoalRecord>> {
        let goals: Vec<GoalRecord> = self.get_json(session, "/goals").await?;
        for goal in &goals {
            goal.validate().map_err(PortalError::MalformedPayload)?;
        }
        info!("Retrieved {} goals", goals.len());
        Ok(goals)
    }

    async fn extract_attributes(&self, session: &Session) -> PortalResult<Vec<AttributeRecord>> {
        let attributes: Vec<AttributeRecord> = self.get_json(session, "/attributes").await?;
        for attribute in &attributes {
            attribute.validate().map_err(PortalError::MalformedPayload)?;
        }
        info!("Retrieved {} attributes", attributes.len());
        Ok(attributes)
    }

    async fn extract_settings(&self, session: &Session) -> PortalResult<AppraisalSettings> {
        self.get_json(session, "/settings").await
    }

    async fn extract_stakeholders(&self, session: &Session) -> PortalResult<StakeholderContext> {
        let stakeholders: Vec<Stakeholder> = self.get_json(session, "/stakeholders").await?;
        Ok(StakeholderContext::new(stakeholders))
    }

    async fn extract_feed_forward(
        &self,
        session: &Session,
    ) -> PortalResult<BTreeMap<String, Vec<FeedForwardCard>>> {
        self.get_json(session, "/feed-forward").await
    }

    async fn submit_comments(
        &self,
        session: &Session,
        comments: &[GeneratedComment],
    ) -> PortalResult<SubmissionReceipt> {
        info!("Submitting {} comments to the portal", comments.len());
        let response = self
            .client
            .post(self.url("/comments"))
            .bearer_auth(&session.token)
            .json(&SubmitRequest { comments })
            .send()
            .await
            .map_err(|e| PortalError::Request(e.to_string()))?;
        Self::decode(response).await
    }
}
