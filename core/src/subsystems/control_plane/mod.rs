/// # NDOC
/// component: `subsystems::control_plane`
/// purpose: Operator-facing surface: agent registry, directive lifecycle,
///   overrides that short-circuit the optimization loop, and the
///   read-only dashboard snapshot.
pub mod dashboard;
pub mod directives;
pub mod overrides;
pub mod registry;
