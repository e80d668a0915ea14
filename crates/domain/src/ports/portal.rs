use crate::entities::{
    AppraisalSettings, AttributeRecord, FeedForwardCard, GeneratedComment, GoalRecord,
    StakeholderContext,
};
use crate::errors::PortalResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Login credentials for the appraisal portal
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: None,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Authenticated portal session, passed explicitly to every portal call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user: None,
        }
    }
}

/// Portal acknowledgement of a comment submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub accepted: usize,
    #[serde(default)]
    pub rejected: Vec<String>,
}

impl SubmissionReceipt {
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Web automation layer: login, extraction and fill-back
#[async_trait]
pub trait AppraisalPortal: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> PortalResult<Session>;

    /// Check whether a previously saved session is still accepted
    async fn validate_session(&self, session: &Session) -> PortalResult<bool>;

    async fn extract_goals(&self, session: &Session) -> PortalResult<Vec<GoalRecord>>;

    async fn extract_attributes(&self, session: &Session) -> PortalResult<Vec<AttributeRecord>>;

    async fn extract_settings(&self, session: &Session) -> PortalResult<AppraisalSettings>;

    async fn extract_stakeholders(&self, session: &Session) -> PortalResult<StakeholderContext>;

    async fn extract_feed_forward(
        &self,
        session: &Session,
    ) -> PortalResult<BTreeMap<String, Vec<FeedForwardCard>>>;

    async fn submit_comments(
        &self,
        session: &Session,
        comments: &[GeneratedComment],
    ) -> PortalResult<SubmissionReceipt>;
}
