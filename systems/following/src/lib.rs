#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Segment following: head trajectory recording, lagged pursuit and spacing.
//!
//! Every tick the world records the head position into a [`PositionHistory`],
//! lets the [`SegmentFollower`] pull each live segment toward the sample its
//! follow delay selects, and finally runs [`enforce_spacing`] so no two live
//! segments overlap.

mod follower;
mod history;
mod spacing;

pub use follower::{look_rotation, smoothing_factor, FollowSettings, SegmentFollower};
pub use history::{PositionHistory, TimestampedSample};
pub use spacing::enforce_spacing;
