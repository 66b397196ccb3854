//! Loan eligibility assessment: loads pre-fitted model artifacts once at
//! startup, then scores one applicant submission at a time and explains the
//! decision against a held-out reference dataset.

pub mod artifacts;
pub mod assessment;
pub mod config;
pub mod error;
pub mod telemetry;
