//! Bounding-box helpers shared by the detection operators
//!
//! Boxes are `(x1, y1, x2, y2)` corners in pixel coordinates.

use num_traits::Float;

/// Area of a box.
///
/// With `normalized == false` the corners are treated as inclusive pixel
/// indices, so a box from 0 to 9 is 10 pixels wide. Degenerate boxes
/// (`x2 < x1` or `y2 < y1`) have zero area.
pub fn bbox_area<T: Float>(bbox: &[T], normalized: bool) -> T {
    let (x1, y1, x2, y2) = (bbox[0], bbox[1], bbox[2], bbox[3]);
    if x2 < x1 || y2 < y1 {
        return T::zero();
    }
    let w = x2 - x1;
    let h = y2 - y1;
    if normalized {
        w * h
    } else {
        (w + T::one()) * (h + T::one())
    }
}
