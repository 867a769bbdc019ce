//! Manage My Queue - client-side queue reconciliation for a work-queue widget
//!
//! This library keeps an operator's task queue in step with a remote system
//! of record. Tasks are split into an Active bucket (assigned for work, bounded
//! by a concurrency cap) and an ordered Hold bucket. Hold reorders are staged
//! locally and rolled back if the remote rejects them; play/pause is applied
//! only once the remote confirms it.
//!
//! # Modules
//!
//! The library is organized into several key modules:
//!
//! * [`backend`] - Remote queue service trait and its HTTP implementation
//! * [`config`] - Session configuration management
//! * [`entities`] - Task and snapshot data structures
//! * [`queue`] - Pure bucket classification, ordering and admission rules
//! * [`sync`] - Reconciliation engine, polling, countdown and the async session
//! * [`utils`] - Utility functions and helpers

/// Remote queue service abstraction layer
pub mod backend;

/// Configuration module for managing session settings
pub mod config;

/// Application constants and default values
pub mod constants;

/// Queue data models
pub mod entities;

/// Logging setup and in-memory notice log
pub mod logger;

/// Bucket classification and admission policy
pub mod queue;

/// Queue reconciliation against the remote service
pub mod sync;

/// Utility functions
pub mod utils;

pub use entities::{Cap, QueueSnapshot, Task};
pub use sync::{Outcome, QueueAction, QueueEvent, QueueSession};
