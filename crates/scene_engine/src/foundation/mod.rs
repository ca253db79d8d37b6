//! Foundation utilities shared by every other module.
//!
//! Nothing in here knows about nodes or scenes: just timing and logging
//! plumbing.

pub mod logging;
pub mod time;
