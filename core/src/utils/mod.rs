/// # NDOC
/// component: `utils`
/// purpose: Cross-cutting capabilities shared by every subsystem: structured
///   logging, the injected clock, and typed configuration loading.
pub mod clock;
pub mod config;
pub mod logger;
