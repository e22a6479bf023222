//! Integration test suite (requires a real Salesforce org).
//!
//! These tests deploy metadata into the org; point them at a scratch org.
//!
//! Run all integration tests with:
//!   SF_AUTH_URL=... cargo test --test integration -- --ignored --nocapture

#[path = "integration/common.rs"]
mod common;
#[path = "integration/deploy.rs"]
mod deploy;
#[path = "integration/session.rs"]
mod session;
