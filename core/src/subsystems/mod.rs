/// # NDOC
/// component: `subsystems`
/// purpose: The five domain subsystems driven by the control plane: lead
///   ingestion, analytics, outbound sequencing, the optimization loop, and
///   error monitoring.
pub mod analytics;
pub mod control_plane;
pub mod error_monitor;
pub mod ingestion;
pub mod optimization_loop;
pub mod scheduler;
