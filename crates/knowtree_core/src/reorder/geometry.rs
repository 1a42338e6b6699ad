//! Pointer geometry and drop-position classification.

use serde::{Deserialize, Serialize};

/// Thresholds for drag recognition and drop zones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragConfig {
    /// Per-axis distance the pointer must exceed before a press becomes a drag
    /// (default: 5.0).
    pub drag_threshold: f64,
    /// Upper share of the target's height that maps to `Before` (default: 0.25).
    pub before_fraction: f64,
    /// Share of the target's height below which the drop is not yet `After`
    /// (default: 0.75).
    pub after_fraction: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 5.0,
            before_fraction: 0.25,
            after_fraction: 0.75,
        }
    }
}

/// Pointer position in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True once `self` has left `origin` by more than `threshold` on either axis.
    pub fn moved_past(&self, origin: Point, threshold: f64) -> bool {
        (self.x - origin.x).abs() > threshold || (self.y - origin.y).abs() > threshold
    }
}

/// Vertical span a target node occupies on the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalExtent {
    pub top: f64,
    pub height: f64,
}

impl VerticalExtent {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }
}

/// Where a dragged node lands relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPosition {
    Before,
    After,
    /// Becomes the target's last child.
    Inside,
}

impl DropPosition {
    /// Classifies pointer height `y` against the target's extent.
    pub fn from_pointer(y: f64, extent: VerticalExtent, config: &DragConfig) -> Self {
        let relative = y - extent.top;
        if relative < extent.height * config.before_fraction {
            Self::Before
        } else if relative > extent.height * config.after_fraction {
            Self::After
        } else {
            Self::Inside
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Inside => "inside",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DragConfig, DropPosition, Point, VerticalExtent};

    #[test]
    fn quarters_map_to_positions() {
        let config = DragConfig::default();
        let extent = VerticalExtent::new(100.0, 40.0);
        assert_eq!(
            DropPosition::from_pointer(105.0, extent, &config),
            DropPosition::Before
        );
        assert_eq!(
            DropPosition::from_pointer(120.0, extent, &config),
            DropPosition::Inside
        );
        assert_eq!(
            DropPosition::from_pointer(135.0, extent, &config),
            DropPosition::After
        );
    }

    #[test]
    fn zone_boundaries_are_inside() {
        let config = DragConfig::default();
        let extent = VerticalExtent::new(0.0, 40.0);
        assert_eq!(
            DropPosition::from_pointer(10.0, extent, &config),
            DropPosition::Inside
        );
        assert_eq!(
            DropPosition::from_pointer(30.0, extent, &config),
            DropPosition::Inside
        );
    }

    #[test]
    fn threshold_is_exclusive_per_axis() {
        let origin = Point::new(10.0, 10.0);
        assert!(!Point::new(15.0, 15.0).moved_past(origin, 5.0));
        assert!(Point::new(15.5, 10.0).moved_past(origin, 5.0));
        assert!(Point::new(10.0, 4.0).moved_past(origin, 5.0));
    }
}
