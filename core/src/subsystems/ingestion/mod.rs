/// # NDOC
/// component: `subsystems::ingestion`
/// purpose: Pulls raw leads from every configured source (Gmail, Meta
///   webhook, website forms, warm/cold imports), normalizes them into a
///   common shape, deduplicates against the store, and persists the result.
pub mod dedup;
pub mod normalizer;
pub mod pipeline;
pub mod pollers;
pub mod signature;
