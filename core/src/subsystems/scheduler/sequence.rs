use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::contracts::{CoreError, CoreResult};
use crate::data_models::lead::ChannelKind;
use crate::data_models::sequence::{delay_for_step, OutboundSequence, SequenceKind, SequenceStatus};
use crate::external::message_sender::MessageSender;

/// Closed substitution set for message template personalization.
#[derive(Debug, Clone, Default)]
pub struct PersonalizationContext {
    pub lead_name: String,
    pub company_name: String,
    pub last_interaction_date: Option<String>,
    pub property_interest: Option<String>,
    pub location: Option<String>,
    pub custom_fields: HashMap<String, String>,
}

/// Substitutes `{leadName}`, `{companyName}`, `{lastInteractionDate}`,
/// `{propertyInterest}`, `{location}`, and `{customFields.*}` placeholders
/// in `template`. Unresolvable placeholders are left as an empty string.
pub fn personalize(template: &str, ctx: &PersonalizationContext) -> String {
    let mut out = template
        .replace("{leadName}", &ctx.lead_name)
        .replace("{companyName}", &ctx.company_name)
        .replace("{lastInteractionDate}", ctx.last_interaction_date.as_deref().unwrap_or(""))
        .replace("{propertyInterest}", ctx.property_interest.as_deref().unwrap_or(""))
        .replace("{location}", ctx.location.as_deref().unwrap_or(""));
    for (key, value) in &ctx.custom_fields {
        out = out.replace(&format!("{{customFields.{key}}}"), value);
    }
    out
}

fn resolve_template(kind: SequenceKind) -> &'static str {
    match kind {
        SequenceKind::Cold => "Hi {leadName}, following up on your interest in {propertyInterest}.",
        SequenceKind::Warm => "Hi {leadName}, it's been a while since we spoke about {propertyInterest}.",
        SequenceKind::Campaign => "Hi {leadName}, {companyName} has new listings in {location}.",
    }
}

/// # NDOC
/// component: `subsystems::scheduler::sequence`
/// purpose: Fires one due step of an `OutboundSequence`: resolves and
///   personalizes the message template, submits it, and advances the
///   sequence's bookkeeping.
pub struct SequenceTicker<'a> {
    sender: &'a dyn MessageSender,
}

impl<'a> SequenceTicker<'a> {
    pub fn new(sender: &'a dyn MessageSender) -> Self {
        Self { sender }
    }

    /// Fires the sequence's current step if due. Returns `true` if a step
    /// was fired, `false` if the sequence had already completed.
    pub async fn fire(
        &self,
        sequence: &mut OutboundSequence,
        destination: &str,
        ctx: &PersonalizationContext,
        now: DateTime<Utc>,
    ) -> CoreResult<bool> {
        if sequence.current_step >= sequence.total_steps {
            sequence.status = SequenceStatus::Completed;
            sequence.next_fire_at = None;
            return Ok(false);
        }

        let template = resolve_template(sequence.kind);
        let message = personalize(template, ctx);

        let outcome = match self.sender.send(ChannelKind::Sms, destination, &message).await {
            Ok(o) => o,
            Err(e) => {
                sequence.status = SequenceStatus::Failed;
                return Err(e);
            }
        };

        if !outcome.delivered {
            sequence.status = SequenceStatus::Failed;
            return Err(CoreError::external_unavailable(
                outcome.failure_reason.unwrap_or_else(|| "message not delivered".to_string()),
            ));
        }

        sequence.interaction_ids.push(Uuid::new_v4());
        sequence.current_step += 1;

        if sequence.current_step >= sequence.total_steps {
            sequence.status = SequenceStatus::Completed;
            sequence.next_fire_at = None;
        } else {
            let delay_days = match sequence.kind {
                SequenceKind::Cold => delay_for_step(sequence.current_step as usize),
                SequenceKind::Warm | SequenceKind::Campaign => 3,
            };
            sequence.next_fire_at = Some(now + chrono::Duration::days(delay_days));
        }

        Ok(true)
    }
}
