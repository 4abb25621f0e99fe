/// # NDOC
/// component: `data_models`
/// purpose: Every persisted entity and its invariants: leads, interactions,
///   performance snapshots, sequences, optimization recommendations and
///   results, feedback sessions, circuit breakers, control-plane entities,
///   and the audit log.
pub mod audit;
pub mod circuit_breaker;
pub mod control_plane;
pub mod feedback;
pub mod interaction;
pub mod lead;
pub mod optimization;
pub mod performance;
pub mod sequence;
