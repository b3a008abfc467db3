//! Shared numeric constants for the canvas crate.

// ── Camera ──────────────────────────────────────────────────────

/// Smallest permitted camera scale (zoomed all the way out).
pub const MIN_SCALE: f64 = 0.1;

/// Largest permitted camera scale (zoomed all the way in).
pub const MAX_SCALE: f64 = 4.0;

/// Padding in canvas units added around the content bounding box by
/// fit-to-content.
pub const FIT_PADDING: f64 = 80.0;

/// Exponential rate applied to wheel deltas during pinch-zoom.
pub const WHEEL_ZOOM_RATE: f64 = 0.002;

/// Scale factor applied by one press of the zoom-in button.
pub const BUTTON_ZOOM_STEP: f64 = 1.2;

// ── Interaction ─────────────────────────────────────────────────

/// Milliseconds of wheel silence before the scrolling flag clears.
pub const SCROLL_QUIESCENCE_MS: f64 = 150.0;

/// Fraction of the visible viewport kept clear of new nodes on each edge.
pub const PLACEMENT_MARGIN_RATIO: f64 = 0.1;

// ── Node sizing ─────────────────────────────────────────────────

/// Default size of a freshly created text node, in canvas units.
pub const TEXT_NODE_DEFAULT_WIDTH: f64 = 320.0;
pub const TEXT_NODE_DEFAULT_HEIGHT: f64 = 240.0;

/// Default size of a freshly created file node, in canvas units.
pub const FILE_NODE_DEFAULT_WIDTH: f64 = 360.0;
pub const FILE_NODE_DEFAULT_HEIGHT: f64 = 280.0;

/// Size bounds applied to every node regardless of kind.
pub const NODE_MIN_WIDTH: f64 = 160.0;
pub const NODE_MIN_HEIGHT: f64 = 120.0;
pub const NODE_MAX_WIDTH: f64 = 960.0;
pub const NODE_MAX_HEIGHT: f64 = 720.0;

// ── Codes ───────────────────────────────────────────────────────

/// Default palette offered for new codes. Custom colors are also accepted.
pub const CODE_PALETTE: [&str; 10] = [
    "#E53935", "#D81B60", "#8E24AA", "#3949AB", "#1E88E5",
    "#00897B", "#43A047", "#FDD835", "#FB8C00", "#6D4C41",
];
