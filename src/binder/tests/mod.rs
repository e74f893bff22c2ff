//! Scenario tests for the binder session.
//!
//! These drive a [`Form`](crate::form::Form) and a [`Session`](super::Session)
//! together the way the notebook does.

mod load_tests;
mod write_tests;
