//! Evidence Aggregator.
//!
//! Fans a claim out into a few query variants, runs them concurrently against a
//! [`SearchProvider`](crate::providers::SearchProvider), and reduces the hits to a
//! deduplicated list ranked by source credibility.

pub mod aggregator;
pub mod credibility;


pub use aggregator::{AggregatorConfig, EvidenceAggregator};
pub use credibility::{CredibilityTable, host_of};
