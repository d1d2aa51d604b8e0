//! Quay registry API module.
//!
//! Manages team and organization membership, repositories, visibility and
//! team permissions for a single organization, and caches team member
//! lookups for the lifetime of the client.

mod cache;
pub mod quay;

pub use cache::MemberCache;
pub use quay::QuayClient;
