use crate::data_models::interaction::{Interaction, InteractionOutcomeStatus};
use crate::data_models::performance::MetricTuple;

/// Computes the metric tuple over a closed interaction set per the
/// analytics engine's metric computations. Division by zero returns 0.
pub fn compute_metrics(interactions: &[Interaction]) -> MetricTuple {
    let total = interactions.len() as u64;
    if total == 0 {
        return MetricTuple {
            total_interactions: 0,
            conversion_rate: 0.0,
            avg_response_ms: 0.0,
            appointment_booking_rate: 0.0,
            csat: 0.0,
        };
    }

    let successful = interactions
        .iter()
        .filter(|i| i.outcome.status == InteractionOutcomeStatus::Successful)
        .count() as f64;
    let conversion_rate = successful / total as f64;

    let durations: Vec<f64> = interactions
        .iter()
        .filter_map(|i| i.duration_s.map(|d| d as f64 * 1000.0))
        .collect();
    let avg_response_ms = if durations.is_empty() {
        0.0
    } else {
        durations.iter().sum::<f64>() / durations.len() as f64
    };

    let booked = interactions.iter().filter(|i| i.outcome.appointment_booked).count() as f64;
    let appointment_booking_rate = booked / total as f64;

    let sentiments: Vec<f64> = interactions.iter().filter_map(|i| i.sentiment.as_ref().map(|s| s.score)).collect();
    let csat = if sentiments.is_empty() {
        0.0
    } else {
        let avg_sentiment = sentiments.iter().sum::<f64>() / sentiments.len() as f64;
        (avg_sentiment + 1.0) * 2.5
    };

    MetricTuple {
        total_interactions: total,
        conversion_rate,
        avg_response_ms,
        appointment_booking_rate,
        csat,
    }
}
