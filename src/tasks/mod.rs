//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside a cache.
//!
//! # Tasks
//! - Expiry Sweeper: Removes age-expired cache entries at a configured interval

mod sweeper;

pub use sweeper::{spawn_sweeper, SweeperHandle};
