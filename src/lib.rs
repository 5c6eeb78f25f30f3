//! `streamsketch` answers approximate questions about large data streams without storing every element:
//!
//! - [`MembershipFilter`]: was this string seen before? (Bloom filter, no false negatives)
//! - [`classify`]: sort candidate values (e.g. new passwords) into unique, already used, or invalid input.
//! - [`CardinalityEstimator`]: how many distinct values were seen? (HyperLogLog with bias correction)
//! - [`ExactCardinality`]: exact distinct count baseline to measure estimator error against.
pub mod access_log;
pub mod classifier;
pub mod comparison;
pub mod counter;
pub mod error;
pub mod estimator;
pub mod exact;
pub mod filter;

pub use classifier::{classify, classify_one, Candidate, Classifications, Status};
pub use error::{Error, Result};
pub use estimator::{CardinalityEstimator, HashWidth};
pub use exact::ExactCardinality;
pub use filter::MembershipFilter;
