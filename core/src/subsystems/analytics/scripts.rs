use crate::data_models::performance::{ScriptMetric, ScriptOptimization, Suggestion};

/// Given per-script current metrics and a set of candidate suggestions,
/// returns one `ScriptOptimization` per script with its recommendations
/// sorted by expected conversion-rate improvement, descending.
pub fn analyze_script_performance(
    scripts: Vec<(ScriptMetric, Vec<Suggestion>)>,
) -> Vec<ScriptOptimization> {
    scripts
        .into_iter()
        .map(|(metric, mut suggestions)| {
            suggestions.sort_by(|a, b| {
                b.expected_impact_pct
                    .partial_cmp(&a.expected_impact_pct)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            ScriptOptimization {
                script_id: metric.script_id.clone(),
                current_metrics: metric,
                recommendations: suggestions,
            }
        })
        .collect()
}
