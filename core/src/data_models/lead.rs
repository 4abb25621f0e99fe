use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::contracts::CoreError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    Gmail,
    MetaAds,
    Website,
    Slack,
    Referral,
    ThirdParty,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LeadType {
    Hot,
    Warm,
    Cold,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Call,
    Sms,
    Email,
    Whatsapp,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Call => "call",
            ChannelKind::Sms => "sms",
            ChannelKind::Email => "email",
            ChannelKind::Whatsapp => "whatsapp",
        }
    }
}

/// # NDOC
/// component: `data_models::lead`
/// purpose: Finite state machine governing a lead's lifecycle. Terminal
///   states `Converted` and `Lost` have no outgoing edges; `Dormant` is
///   re-entrable via `Contacted`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    AppointmentScheduled,
    Converted,
    Dormant,
    Lost,
}

impl LeadStatus {
    /// Returns `true` iff the edge `self -> to` is permitted by the
    /// status graph.
    pub fn can_transition_to(&self, to: LeadStatus) -> bool {
        use LeadStatus::*;
        matches!(
            (self, to),
            (New, Contacted)
                | (New, Dormant)
                | (New, Lost)
                | (Contacted, Qualified)
                | (Contacted, Dormant)
                | (Contacted, Lost)
                | (Qualified, AppointmentScheduled)
                | (Qualified, Dormant)
                | (Qualified, Lost)
                | (AppointmentScheduled, Converted)
                | (AppointmentScheduled, Contacted)
                | (AppointmentScheduled, Lost)
                | (Dormant, Contacted)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactInfo {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub preferred_channel: ChannelKind,
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Qualification {
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub location: Option<String>,
    pub property_type: Option<String>,
    pub timeline: Option<String>,
    pub score: f64,
}

impl Default for Qualification {
    fn default() -> Self {
        Self {
            budget_min: None,
            budget_max: None,
            location: None,
            property_type: None,
            timeline: None,
            score: 0.0,
        }
    }
}

/// # NDOC
/// component: `data_models::lead`
/// purpose: The customer record flowing through ingestion, sequencing, and
///   the optimization loop.
/// invariants:
///   - At least one of `contact.email`/`contact.phone` is non-empty once
///     `status` leaves `New`.
///   - `urgency` in `1..=10`; `qualification.score` in `0.0..=1.0`.
///   - `status` transitions follow `LeadStatus::can_transition_to` only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lead {
    pub id: Uuid,
    pub source: LeadSource,
    pub contact: ContactInfo,
    pub lead_type: LeadType,
    pub urgency: u8,
    pub intent_signals: BTreeSet<String>,
    pub qualification: Qualification,
    pub status: LeadStatus,
    pub assigned_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(1..=10).contains(&self.urgency) {
            return Err(CoreError::validation(format!(
                "urgency {} must be in 1..=10",
                self.urgency
            )));
        }
        if !(0.0..=1.0).contains(&self.qualification.score) {
            return Err(CoreError::validation(format!(
                "qualification.score {} must be in 0.0..=1.0",
                self.qualification.score
            )));
        }
        if self.status != LeadStatus::New
            && self.contact.email.is_none()
            && self.contact.phone.is_none()
        {
            return Err(CoreError::validation(
                "lead must have an email or phone before leaving status new".to_string(),
            ));
        }
        Ok(())
    }

    /// Attempts the status transition `self.status -> to`. Returns
    /// `InvalidStateTransition` if the edge is not permitted; the lead is
    /// left unmodified on failure.
    pub fn transition_status(&mut self, to: LeadStatus, now: DateTime<Utc>) -> Result<(), CoreError> {
        if !self.status.can_transition_to(to) {
            return Err(CoreError::invalid_state_transition(format!(
                "{:?} -> {:?} is not a permitted lead status edge",
                self.status, to
            )));
        }
        self.status = to;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_lead(status: LeadStatus) -> Lead {
        Lead {
            id: Uuid::new_v4(),
            source: LeadSource::Website,
            contact: ContactInfo {
                name: "Jane".to_string(),
                email: Some("jane@example.com".to_string()),
                phone: None,
                preferred_channel: ChannelKind::Email,
                timezone: "UTC".to_string(),
            },
            lead_type: LeadType::Hot,
            urgency: 8,
            intent_signals: BTreeSet::new(),
            qualification: Qualification::default(),
            status,
            assigned_agent: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn s3_illegal_transition_is_rejected_and_lead_unchanged() {
        let mut lead = sample_lead(LeadStatus::New);
        let before = lead.clone();
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
        let err = lead
            .transition_status(LeadStatus::Converted, now)
            .expect_err("new -> converted must be rejected");
        assert_eq!(err.kind, crate::contracts::CoreErrorKind::InvalidStateTransition);
        assert_eq!(lead, before);
    }

    #[test]
    fn legal_transition_chain_succeeds() {
        let mut lead = sample_lead(LeadStatus::New);
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
        lead.transition_status(LeadStatus::Contacted, now).unwrap();
        lead.transition_status(LeadStatus::Qualified, now).unwrap();
        lead.transition_status(LeadStatus::AppointmentScheduled, now)
            .unwrap();
        lead.transition_status(LeadStatus::Converted, now).unwrap();
        assert_eq!(lead.status, LeadStatus::Converted);
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        assert!(!LeadStatus::Converted.can_transition_to(LeadStatus::Contacted));
        assert!(!LeadStatus::Lost.can_transition_to(LeadStatus::Contacted));
    }

    #[test]
    fn dormant_reenters_via_contacted_only() {
        assert!(LeadStatus::Dormant.can_transition_to(LeadStatus::Contacted));
        assert!(!LeadStatus::Dormant.can_transition_to(LeadStatus::Qualified));
    }

    #[test]
    fn urgency_out_of_range_fails_validation() {
        let mut lead = sample_lead(LeadStatus::New);
        lead.urgency = 11;
        assert!(lead.validate().is_err());
    }
}
