//! Built-in block outliner
//!
//! Renders every visible character as a solid rectangular block. It needs
//! no font data, so labels can be built and exported without a typeface
//! service; glyph shapes are not its concern.

use crate::foundation::math::Vec3;
use crate::render::primitives::Mesh;

use super::{FontError, FontFuture, GlyphOutline, GlyphOutliner};

/// Horizontal advance per character, as a fraction of the font size
const ADVANCE_RATIO: f32 = 0.6;

/// Block width per character, as a fraction of the font size
const GLYPH_WIDTH_RATIO: f32 = 0.5;

/// Font handle of the block outliner
#[derive(Debug, Clone, PartialEq)]
pub struct BlockFont {
    /// Location the font was requested from
    pub source: String,
}

/// Outliner producing one box per non-whitespace character
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockGlyphOutliner;

impl BlockGlyphOutliner {
    /// Create the outliner
    pub fn new() -> Self {
        Self
    }
}

impl GlyphOutliner for BlockGlyphOutliner {
    type Font = BlockFont;

    fn load_font(&self, url: &str) -> FontFuture<BlockFont> {
        let source = url.trim().to_string();
        Box::pin(async move {
            if source.is_empty() {
                return Err(FontError::FontUnavailable("empty font location".to_string()));
            }
            Ok(BlockFont { source })
        })
    }

    fn outline(&self, text: &str, _font: &BlockFont, size: f32, extrusion: f32) -> Result<GlyphOutline, FontError> {
        if !(size > 0.0 && extrusion > 0.0) {
            return Err(FontError::OutlineFailed(format!(
                "size {size} and extrusion {extrusion} must be positive"
            )));
        }

        let advance = size * ADVANCE_RATIO;
        let glyph_width = size * GLYPH_WIDTH_RATIO;

        let mut mesh = Mesh::default();
        for (index, _) in text.chars().enumerate().filter(|(_, c)| !c.is_whitespace()) {
            let mut glyph = Mesh::cuboid(glyph_width, size, extrusion);
            // Box corner at (cursor, baseline, 0)
            glyph.translate(Vec3::new(
                index as f32 * advance + glyph_width / 2.0,
                size / 2.0,
                extrusion / 2.0,
            ));
            mesh.append(&glyph);
        }

        let bounds = mesh
            .bounding_box()
            .ok_or_else(|| FontError::OutlineFailed(format!("no glyphs in {text:?}")))?;
        Ok(GlyphOutline { mesh, bounds })
    }
}
