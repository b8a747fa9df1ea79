//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::Rotation;

/// Smallest and largest accepted resize percentage.
pub const MIN_PERCENT: u32 = 10;
pub const MAX_PERCENT: u32 = 100;

/// Longer edge below which the size-limit search stops shrinking.
pub const MIN_EDGE: u32 = 16;

/// Longer-edge target for a percentage of the original.
///
/// `percent` is clamped to 10–100, so the result never upscales.
///
/// ```
/// # use imgkit::imaging::target_longer_edge;
/// assert_eq!(target_longer_edge((4000, 3000), 50), 2000);
/// assert_eq!(target_longer_edge((4000, 3000), 500), 4000);
/// ```
pub fn target_longer_edge(original: (u32, u32), percent: u32) -> u32 {
    let (w, h) = original;
    let percent = percent.clamp(MIN_PERCENT, MAX_PERCENT);
    ((w.max(h) as f64 * percent as f64 / 100.0).round() as u32).max(1)
}

/// Dimensions that fit `original` within a longer edge of `max_edge`,
/// preserving aspect ratio. Never upscales.
pub fn fit_within(original: (u32, u32), max_edge: u32) -> (u32, u32) {
    let (w, h) = original;
    let longer = w.max(h);
    if longer <= max_edge || longer == 0 {
        return (w, h);
    }
    let ratio = max_edge as f64 / longer as f64;
    if w >= h {
        (max_edge, ((h as f64 * ratio).round() as u32).max(1))
    } else {
        (((w as f64 * ratio).round() as u32).max(1), max_edge)
    }
}

/// Output canvas size after rotating a `width`×`height` image.
pub fn rotated_dimensions(dims: (u32, u32), rotation: Rotation) -> (u32, u32) {
    if rotation.swaps_dimensions() {
        (dims.1, dims.0)
    } else {
        dims
    }
}

/// One shrink step of the size-limit search: 90% of the longer edge.
///
/// Returns `None` once the image would drop below [`MIN_EDGE`] or stops changing.
pub fn shrink_step(dims: (u32, u32)) -> Option<(u32, u32)> {
    let longer = dims.0.max(dims.1);
    let next_edge = (longer as f64 * 0.9).floor() as u32;
    if next_edge < MIN_EDGE || next_edge >= longer {
        return None;
    }
    Some(fit_within(dims, next_edge))
}

/// Byte count as kilobytes, the unit the reports use.
pub fn kilobytes(bytes: u64) -> f64 {
    bytes as f64 / 1024.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_edge_uses_longer_side() {
        assert_eq!(target_longer_edge((3000, 4000), 25), 1000);
    }

    #[test]
    fn target_edge_clamps_percent() {
        assert_eq!(target_longer_edge((1000, 500), 1), 100);
        assert_eq!(target_longer_edge((1000, 500), 0), 100);
        assert_eq!(target_longer_edge((1000, 500), 150), 1000);
    }

    #[test]
    fn fit_within_landscape() {
        assert_eq!(fit_within((4000, 3000), 2000), (2000, 1500));
    }

    #[test]
    fn fit_within_portrait() {
        assert_eq!(fit_within((3000, 4000), 2000), (1500, 2000));
    }

    #[test]
    fn fit_within_never_upscales() {
        assert_eq!(fit_within((800, 600), 2000), (800, 600));
    }

    #[test]
    fn fit_within_keeps_thin_images_visible() {
        assert_eq!(fit_within((10000, 10), 100), (100, 1));
    }

    #[test]
    fn rotated_dimensions_swap_on_quarter_turns() {
        assert_eq!(rotated_dimensions((40, 30), Rotation::Quarter), (30, 40));
        assert_eq!(rotated_dimensions((40, 30), Rotation::Half), (40, 30));
        assert_eq!(rotated_dimensions((40, 30), Rotation::ThreeQuarters), (30, 40));
    }

    #[test]
    fn shrink_step_reduces_by_ten_percent() {
        assert_eq!(shrink_step((1000, 500)), Some((900, 450)));
    }

    #[test]
    fn shrink_step_stops_at_min_edge() {
        assert_eq!(shrink_step((17, 10)), None);
        assert_eq!(shrink_step((5, 5)), None);
    }

    #[test]
    fn kilobytes_conversion() {
        assert_eq!(kilobytes(2048), 2.0);
    }
}
