//! Utility modules for the queue engine.
//!
//! # Available Utilities
//!
//! - [`datetime`] - Countdown formatting and due-date proximity helpers

pub mod datetime;
