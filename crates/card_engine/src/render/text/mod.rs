//! Extruded text labels
//!
//! Glyph tessellation is an external service reached through
//! [`GlyphOutliner`]. This module wraps its output into positioned label
//! fragments with picking proxies.
//!
//! # Architecture
//!
//! - [`GlyphOutliner`]: font loading and text outlining boundary
//! - [`FontSlot`]: one-shot, memoized font load shared by every label build
//! - [`LabelBuilder`]: centering, emboss/engrave placement, proxy volume
//! - [`BlockGlyphOutliner`]: deterministic built-in outliner
//!
//! # Example
//!
//! ```no_run
//! use card_engine::core::config::LayoutConstants;
//! use card_engine::render::text::{BlockGlyphOutliner, LabelBuilder, LabelSpec};
//!
//! let mut builder = LabelBuilder::new(BlockGlyphOutliner::new(), "builtin", LayoutConstants::default());
//! let spec = LabelSpec::new("fullName", "Ada").with_size(8.0).with_position(0.0, 10.0);
//! let fragment = pollster::block_on(builder.build(&spec, 2.0));
//! ```

mod glyph_outline;
mod block_glyphs;
mod label_builder;

pub use glyph_outline::{FontFuture, FontSlot, GlyphOutline, GlyphOutliner};
pub use block_glyphs::{BlockFont, BlockGlyphOutliner};
pub use label_builder::{LabelBuilder, LabelSpec, PlacementMode, PROXY_NAME_PREFIX};

use thiserror::Error;

/// Errors from the glyph outline service
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FontError {
    /// The font failed to load; no label can be built
    #[error("Font unavailable: {0}")]
    FontUnavailable(String),

    /// The service could not outline the requested text
    #[error("Outline failed: {0}")]
    OutlineFailed(String),
}
