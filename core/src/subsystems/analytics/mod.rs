/// # NDOC
/// component: `subsystems::analytics`
/// purpose: Computes per-agent performance metrics, script recommendations,
///   trend classification, intelligence reports, and baseline-vs-current
///   impact measurement.
pub mod engine;
pub mod impact;
pub mod insights;
pub mod metrics;
pub mod scripts;
pub mod trends;
