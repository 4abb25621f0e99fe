/// # NDOC
/// component: `subsystems::error_monitor`
/// purpose: Classifies failures surfaced by every other subsystem, tracks
///   per-resource circuit breakers, derives overall system status, and
///   fans out threshold alerts.
/// invariants: system status is a pure function of the retention window and
///   breaker registry, never mutated directly.
pub mod alerts;
pub mod circuit_breaker;
pub mod classification;
pub mod monitor;
