//! Finds the first available passport appointment at the Swedish Police.
//!
//! `passtider` walks the booking site's wizard with a cookie-keeping HTTP
//! session, reads the "first available time" timetable, and prints a short
//! Swedish report: free slots per office, the totals, and how far away the
//! earliest slot is.
//!
//! The tool is also shipped as a container image, so the crate carries the
//! image recipe and the engine plumbing needed to build and verify it.
//!
//! # Modules
//!
//! - [`booking`]: The booking wizard session and its HTTP transport
//! - [`config`]: Configuration system with layered precedence (CLI > env > file > defaults)
//! - [`engine`]: Container engine connection, image build and verification
//! - [`error`]: Semantic error types for the application
//! - [`image`]: Container image recipe and build context
//! - [`report`]: Terminal report rendering
//! - [`snapshot`]: Saved copies of fetched pages
//! - [`timetable`]: Timetable page parsing

pub mod booking;
pub mod config;
pub mod engine;
pub mod error;
pub mod image;
pub mod report;
pub mod snapshot;
pub mod timetable;
