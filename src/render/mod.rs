//! Arrangement rendering
//!
//! - Arrangement items and validation
//! - Time-stretch / pitch-shift strategies (external processor, phase vocoder)
//! - Bar-grid timeline with crossfades, fade-out and peak ceiling

pub mod arrangement;
pub mod external;
pub mod phase_vocoder;
pub mod stretch;
pub mod timeline;

pub use arrangement::ArrangementItem;
pub use stretch::{StretchOutcome, StretchStrategy, TimeStretcher};
pub use timeline::{render_arrangement, Mix, Placement, RenderOutput};
