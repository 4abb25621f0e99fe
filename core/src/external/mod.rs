/// # NDOC
/// component: `external`
/// purpose: Narrow trait contracts for the worker-agent collaborators the
///   core mutates or calls into, plus reference/mock implementations.
pub mod message_sender;
pub mod response_analyzer;
pub mod routing_agent;
