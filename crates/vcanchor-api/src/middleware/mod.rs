//! # Middleware
//!
//! Tower middleware layered onto the router in [`crate::app`].

pub mod metrics;
