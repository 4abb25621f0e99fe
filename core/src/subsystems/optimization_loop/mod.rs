/// # NDOC
/// component: `subsystems::optimization_loop`
/// purpose: The central controller (§4.7): collects analytics feedback,
///   synthesizes threshold-based recommendations, applies them against
///   routing agents, and validates or rolls back optimizations whose
///   testing window has elapsed.
pub mod apply;
pub mod controller;
pub mod feedback;
pub mod recommendations;
pub mod validate;
