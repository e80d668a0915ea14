use crate::store::write_atomic;
use domain::{AppraisalPortal, AppraisalResult, Credentials, PortalResult, Session};
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, warn};

/// Keeps the portal session on disk so a re-run can skip the login
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Saved session, or `None` if the file is missing or unreadable
    pub async fn load(&self) -> Option<Session> {
        let content = fs::read_to_string(&self.path).await.ok()?;
        match serde_json::from_str(&content) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!("Ignoring unreadable session file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    pub async fn save(&self, session: &Session) -> AppraisalResult<()> {
        let json = serde_json::to_vec_pretty(session).map_err(|e| {
            domain::AppraisalError::persistence(self.path.display().to_string(), e.to_string())
        })?;
        write_atomic(&self.path, &json).await
    }

    /// Reuse the saved session if the portal still accepts it, otherwise log in
    pub async fn acquire(
        &self,
        portal: &dyn AppraisalPortal,
        credentials: &Credentials,
    ) -> PortalResult<Session> {
        if let Some(saved) = self.load().await {
            if portal.validate_session(&saved).await? {
                info!("Reusing saved portal session");
                return Ok(saved);
            }
            info!("Saved portal session expired");
        }

        let session = portal.login(credentials).await?;
        if let Err(e) = self.save(&session).await {
            warn!("Could not save portal session: {}", e);
        }
        Ok(session)
    }
}
