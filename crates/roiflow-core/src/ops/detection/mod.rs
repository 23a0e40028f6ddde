//! Detection-specific operators: box geometry and FPN level distribution

pub mod box_utils;
pub mod distribute_fpn_proposals;

pub use box_utils::bbox_area;
pub use distribute_fpn_proposals::{distribute_fpn_proposals, fpn_target_level, FpnDistribution};
