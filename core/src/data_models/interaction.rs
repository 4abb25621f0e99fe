use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contracts::CoreError;
use crate::data_models::lead::ChannelKind;
use crate::invariants::ensure_duration_for_channel;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InteractionDirection {
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InteractionOutcomeStatus {
    Successful,
    Failed,
    Transferred,
    Pending,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sentiment {
    pub score: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NextAction {
    pub action: String,
    pub scheduled_at: DateTime<Utc>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionOutcome {
    pub status: InteractionOutcomeStatus,
    pub appointment_booked: bool,
    pub qualification_updated: bool,
    pub escalation_required: bool,
}

/// # NDOC
/// component: `data_models::interaction`
/// purpose: One outbound/inbound exchange on one channel, tied to a lead.
/// invariants:
///   - `duration_s`, if present, is bounded per `ChannelKind`: call
///     30..=3600s, sms/email/whatsapp 0..=300s.
///   - `next_action.scheduled_at` must be strictly after `now()` at
///     creation time.
///   - The outcome `Transferred` is independent of the lead status FSM — it
///     never triggers a `Lead::transition_status` call on its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub agent_id: String,
    pub channel: ChannelKind,
    pub direction: InteractionDirection,
    pub content: String,
    pub outcome: InteractionOutcome,
    pub duration_s: Option<u32>,
    pub sentiment: Option<Sentiment>,
    pub next_action: Option<NextAction>,
    pub timestamp: DateTime<Utc>,
}

impl Interaction {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), CoreError> {
        if let Some(duration_s) = self.duration_s {
            ensure_duration_for_channel(self.channel.as_str(), duration_s)?;
        }
        if let Some(sentiment) = &self.sentiment {
            if !(-1.0..=1.0).contains(&sentiment.score) {
                return Err(CoreError::validation(format!(
                    "sentiment.score {} must be in -1.0..=1.0",
                    sentiment.score
                )));
            }
            if !(0.0..=1.0).contains(&sentiment.confidence) {
                return Err(CoreError::validation(format!(
                    "sentiment.confidence {} must be in 0.0..=1.0",
                    sentiment.confidence
                )));
            }
        }
        if let Some(next_action) = &self.next_action {
            if next_action.scheduled_at <= now {
                return Err(CoreError::validation(
                    "next_action.scheduled_at must be strictly after now".to_string(),
                ));
            }
        }
        Ok(())
    }
}
