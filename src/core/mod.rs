//! Core board logic: eligibility gates, the vote and upload write paths,
//! and the ranking aggregator

pub mod eligibility;
pub mod ranking;
pub mod uploads;
pub mod voting;
