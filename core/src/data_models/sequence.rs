use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contracts::CoreError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SequenceStatus {
    Active,
    Paused,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SequenceKind {
    Cold,
    Warm,
    Campaign,
}

/// # NDOC
/// component: `data_models::sequence`
/// purpose: A scheduled multi-step contact plan.
/// invariants:
///   - `0 <= current_step <= total_steps`.
///   - `status == Completed` iff `current_step == total_steps`.
///   - if `status == Active` then `next_fire_at` is `Some`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutboundSequence {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub campaign_id: Uuid,
    pub kind: SequenceKind,
    pub current_step: u32,
    pub total_steps: u32,
    pub next_fire_at: Option<DateTime<Utc>>,
    pub status: SequenceStatus,
    pub interaction_ids: Vec<Uuid>,
}

impl OutboundSequence {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.current_step > self.total_steps {
            return Err(CoreError::integrity(format!(
                "current_step {} exceeds total_steps {}",
                self.current_step, self.total_steps
            )));
        }
        if self.status == SequenceStatus::Completed && self.current_step != self.total_steps {
            return Err(CoreError::integrity(
                "status=completed requires current_step == total_steps".to_string(),
            ));
        }
        if self.status == SequenceStatus::Active && self.next_fire_at.is_none() {
            return Err(CoreError::integrity(
                "status=active requires next_fire_at to be set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), CoreError> {
        if self.status != SequenceStatus::Active {
            return Err(CoreError::invalid_state_transition(format!(
                "cannot pause sequence in status {:?}",
                self.status
            )));
        }
        self.status = SequenceStatus::Paused;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), CoreError> {
        if self.status != SequenceStatus::Paused {
            return Err(CoreError::invalid_state_transition(format!(
                "cannot resume sequence in status {:?}",
                self.status
            )));
        }
        self.status = SequenceStatus::Active;
        Ok(())
    }
}

/// Progressive step delays in days for a cold follow-up sequence. Index
/// beyond the table saturates at the last entry.
pub const COLD_STEP_DELAYS_DAYS: [i64; 5] = [1, 3, 7, 14, 30];

pub fn delay_for_step(step_index: usize) -> i64 {
    let last = COLD_STEP_DELAYS_DAYS.len() - 1;
    COLD_STEP_DELAYS_DAYS[step_index.min(last)]
}

/// Total step count for a warm re-engagement sequence, decided by the
/// positive-sentiment fraction: `> 0.6` yields a 3-step chain, else 5.
pub fn warm_total_steps(positive_sentiment_fraction: f64) -> u32 {
    if positive_sentiment_fraction > 0.6 {
        3
    } else {
        5
    }
}

// --- A/B testing bookkeeping (§4.6.1) ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AbVariant {
    A,
    B,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VariantCounts {
    pub sent: u64,
    pub opened: u64,
    pub responded: u64,
    pub converted: u64,
}

impl VariantCounts {
    pub fn conversion_rate(&self) -> f64 {
        if self.sent == 0 {
            0.0
        } else {
            self.converted as f64 / self.sent as f64
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AbWinner {
    A,
    B,
    Inconclusive,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AbTestResult {
    pub significant: bool,
    pub p_value_approx: f64,
    pub winner: AbWinner,
}
