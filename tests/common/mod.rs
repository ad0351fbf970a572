//! Common test utilities for the pipeline scenarios
//!
//! Fixtures are sample documents with matching model replies; the
//! builders wire pipelines over the in-library mock providers.

#![allow(dead_code, unused_imports)]

pub mod fixtures;
pub mod pipelines;

pub use fixtures::{fenced, EMPLOYMENT_AGREEMENT, KOREAN_LEASE, KOREAN_NDA, NDA_REPLY};
pub use pipelines::{pipeline_with, replying};
