//! Pooling operations for detection heads
//!
//! Region-of-interest pooling (max) and RoI Align (bilinear average) over
//! `[batch, channels, height, width]` feature maps.

pub mod roi_pooling;

pub use roi_pooling::{roi_align2d, roi_pool2d};
