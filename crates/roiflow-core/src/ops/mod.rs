//! Operators composed by the RoI extraction layers

pub mod detection;
pub mod manipulation;
pub mod pooling;

pub use detection::{bbox_area, distribute_fpn_proposals, fpn_target_level, FpnDistribution};
pub use manipulation::{concat, gather, lod_reset, lod_reset_with};
pub use pooling::{roi_align2d, roi_pool2d};
