//! Geometry types for terminal and window sizes.

use serde::{Deserialize, Serialize};

/// Terminal size in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TermSize {
    /// Number of columns
    pub cols: u16,
    /// Number of rows
    pub rows: u16,
}

impl TermSize {
    /// Create a new terminal size.
    pub fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }

    /// Whether either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.cols == 0 || self.rows == 0
    }
}

impl Default for TermSize {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

impl std::fmt::Display for TermSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}

/// Size of the terminal widget in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelSize {
    /// Width in pixels
    pub width: u16,
    /// Height in pixels
    pub height: u16,
}

impl PixelSize {
    /// Create a new pixel size.
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// A resize request that has not reached the backend yet.
///
/// Only the latest request is kept; a connector replays it once when the
/// backend becomes ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingGeometry {
    /// Requested terminal size
    pub term: TermSize,
    /// Requested pixel size
    pub pixels: PixelSize,
}

impl PendingGeometry {
    /// Create a pending geometry from both sizes.
    pub fn new(term: TermSize, pixels: PixelSize) -> Self {
        Self { term, pixels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_size_default() {
        let size = TermSize::default();
        assert_eq!(size.cols, 80);
        assert_eq!(size.rows, 24);
        assert!(!size.is_empty());
    }

    #[test]
    fn test_term_size_empty() {
        assert!(TermSize::new(0, 24).is_empty());
        assert!(TermSize::new(80, 0).is_empty());
    }

    #[test]
    fn test_term_size_display() {
        assert_eq!(TermSize::new(132, 43).to_string(), "132x43");
    }

    #[test]
    fn test_pending_geometry() {
        let pending = PendingGeometry::new(TermSize::new(80, 24), PixelSize::new(640, 480));
        assert_eq!(pending.term, TermSize::new(80, 24));
        assert_eq!(pending.pixels.width, 640);
        assert_eq!(pending.pixels.height, 480);
    }
}
