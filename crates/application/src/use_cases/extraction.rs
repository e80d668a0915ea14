//! Portal extraction and fill-back

use domain::{
    AppraisalError, AppraisalPortal, AppraisalResult, AppraisalSnapshot, CommentSet,
    ConversationContext, PortalResult, Session, SubmissionReceipt,
};
use tracing::{info, warn};

/// Scrape everything needed for a run from the portal.
///
/// Goals and attributes are required. Settings, stakeholders and feed-forward
/// cards are context only: when the portal cannot deliver them the run goes on
/// without them. User notes are never extracted; they live in the input
/// directory.
pub async fn extract_snapshot(
    portal: &dyn AppraisalPortal,
    session: &Session,
) -> AppraisalResult<AppraisalSnapshot> {
    let goals = portal.extract_goals(session).await?;
    let attributes = portal.extract_attributes(session).await?;

    let settings = portal.extract_settings(session).await.unwrap_or_else(|e| {
        warn!("Could not extract appraisal settings: {}", e);
        Default::default()
    });
    let stakeholders = portal
        .extract_stakeholders(session)
        .await
        .unwrap_or_else(|e| {
            warn!("Could not extract stakeholders: {}", e);
            Default::default()
        });
    let feed_forward = portal
        .extract_feed_forward(session)
        .await
        .unwrap_or_else(|e| {
            warn!("Could not extract feed-forward cards: {}", e);
            Default::default()
        });

    let snapshot = AppraisalSnapshot {
        goals,
        attributes,
        stakeholders,
        conversation: ConversationContext {
            feed_forward,
            user_notes: None,
        },
        settings,
    };
    snapshot
        .check_unique_ids()
        .map_err(|e| AppraisalError::ExtractionFailure(e.to_string()))?;

    info!(
        goals = snapshot.goals.len(),
        attributes = snapshot.attributes.len(),
        "Extracted appraisal records"
    );
    Ok(snapshot)
}

/// Push finalized comments back into the portal form
pub async fn submit_comments(
    portal: &dyn AppraisalPortal,
    session: &Session,
    comments: &CommentSet,
) -> PortalResult<SubmissionReceipt> {
    let comments: Vec<_> = comments.iter().cloned().collect();
    let receipt = portal.submit_comments(session, &comments).await?;
    if receipt.is_complete() {
        info!(accepted = receipt.accepted, "Portal accepted all comments");
    } else {
        warn!(
            accepted = receipt.accepted,
            rejected = ?receipt.rejected,
            "Portal rejected some comments"
        );
    }
    Ok(receipt)
}
