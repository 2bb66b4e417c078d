//! Tab normalization and layout engine.
//!
//! Provides:
//! - `stops` - tab stop list, validation and ruler edits
//! - `normalize` - pending-tab resolution, fragmentation, fragment cleanup
//! - `layout` - per-fragment padding from the stop list and measured widths

pub mod layout;
pub mod normalize;
pub mod stops;

pub use layout::{layout, layout_line, node_width};
pub use normalize::{cleanup_fragments, fragment, normalize, resolve_pending};
pub use stops::{TabDirection, TabStop, add_stop, cycle_stop, parse_stops, validate};
