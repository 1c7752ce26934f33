//! Label fragment construction
//!
//! Turns a [`LabelSpec`] into a positioned label fragment carrying an
//! invisible picking proxy. Placement along Z follows the label's mode:
//! embossed labels stand on the card face, engraved labels sink into it.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::core::config::LayoutConstants;
use crate::foundation::math::Vec3;
use crate::physics::collision::AABB;
use crate::render::material::Material;
use crate::render::primitives::Mesh;
use crate::scene::{Fragment, FragmentKind, SceneError, LABEL_NAME_PREFIX};

use super::{FontSlot, GlyphOutline, GlyphOutliner};

/// Prefix of picking proxy names; the label id follows it
pub const PROXY_NAME_PREFIX: &str = "pickingProxy_";

/// Whether a label protrudes from or sinks into the card face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementMode {
    /// Back face on the card face, protruding outward
    #[default]
    Emboss,
    /// Front face just below the card face
    Engrave,
}

impl PlacementMode {
    /// Local z of the label's back face
    ///
    /// Emboss: `half_depth`. Engrave: `half_depth - extrusion - reveal`,
    /// which leaves the front face `reveal` below the card face.
    pub fn placement_z(self, half_depth: f32, extrusion: f32, reveal: f32) -> f32 {
        match self {
            Self::Emboss => half_depth,
            Self::Engrave => half_depth - extrusion - reveal,
        }
    }

    /// Label color used when the label sets none
    pub fn default_color(self) -> u32 {
        match self {
            Self::Emboss => 0x333333,
            Self::Engrave => 0xaaaaaa,
        }
    }
}

/// Everything needed to build one label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelSpec {
    /// Unique label id within the card (`fullName`, `phone`, ...)
    pub id: String,
    /// Text content; blank text means "no label"
    pub text: String,
    /// Font size (cap height) in millimeters
    pub size: f32,
    /// Extrusion depth in millimeters
    pub extrusion: f32,
    /// Horizontal center in card-local millimeters
    pub x: f32,
    /// Baseline height in card-local millimeters
    pub y: f32,
    /// Emboss or engrave
    pub mode: PlacementMode,
    /// Explicit color as 0xRRGGBB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
}

impl Default for LabelSpec {
    fn default() -> Self {
        Self {
            id: String::new(),
            text: String::new(),
            size: 8.0,
            extrusion: 1.0,
            x: 0.0,
            y: 0.0,
            mode: PlacementMode::Emboss,
            color: None,
        }
    }
}

impl LabelSpec {
    /// Create a spec with default size, extrusion and placement
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    /// Set the text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the font size
    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    /// Set the extrusion depth
    pub fn with_extrusion(mut self, extrusion: f32) -> Self {
        self.extrusion = extrusion;
        self
    }

    /// Set the card-local position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Set the placement mode
    pub fn with_mode(mut self, mode: PlacementMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set an explicit color
    pub fn with_color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    /// True when the text is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Explicit color, or the mode default
    pub fn resolved_color(&self) -> u32 {
        self.color.unwrap_or_else(|| self.mode.default_color())
    }
}

/// Builds label fragments through a glyph outliner
///
/// The font load starts when the builder is created. The first build awaits
/// it; later builds find the font already resolved.
pub struct LabelBuilder<G: GlyphOutliner> {
    outliner: G,
    font: FontSlot<G::Font>,
    layout: LayoutConstants,
}

impl<G: GlyphOutliner> LabelBuilder<G> {
    /// Create a builder and start loading the font at `font_url`
    pub fn new(outliner: G, font_url: &str, layout: LayoutConstants) -> Self {
        log::debug!("Loading font from {}", font_url);
        let font = FontSlot::Pending(outliner.load_font(font_url));
        Self { outliner, font, layout }
    }

    /// True once the font has loaded
    pub fn font_ready(&self) -> bool {
        self.font.is_ready()
    }

    /// Placement constants in use
    pub fn layout(&self) -> &LayoutConstants {
        &self.layout
    }

    /// Build the label fragment for `spec` on a card of `card_depth`
    ///
    /// Returns `Ok(None)` for blank text. Suspends until the font load
    /// settles; a failed load yields [`FontError::FontUnavailable`](super::FontError).
    pub async fn build(&mut self, spec: &LabelSpec, card_depth: f32) -> Result<Option<Fragment>, SceneError> {
        if spec.is_blank() {
            return Ok(None);
        }
        for (name, value) in [("size", spec.size), ("extrusion", spec.extrusion)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SceneError::InvalidParameter { name, value });
            }
        }

        let font = self.font.resolve().await?;
        let GlyphOutline { mut mesh, bounds } =
            self.outliner.outline(&spec.text, font, spec.size, spec.extrusion)?;

        // Center horizontally before placement
        let center_x = (bounds.min.x + bounds.max.x) * 0.5;
        mesh.translate(Vec3::new(-center_x, 0.0, 0.0));

        let z = spec
            .mode
            .placement_z(card_depth * 0.5, spec.extrusion, self.layout.engrave_reveal);

        let material = Rc::new(
            Material::new(format!("labelMaterial_{}", spec.id), spec.resolved_color())
                .with_roughness(0.3)
                .with_metalness(0.1),
        );

        let label = Fragment::new(
            format!("{LABEL_NAME_PREFIX}{}", spec.id),
            FragmentKind::Label { label_id: spec.id.clone() },
            mesh,
            material,
        )
        .with_position(Vec3::new(spec.x, spec.y, z))
        .with_child(self.picking_proxy(spec, &bounds));

        log::debug!(
            "Built label '{}' ({:?}) at ({}, {}, {})",
            spec.id, spec.mode, spec.x, spec.y, z
        );
        Ok(Some(label))
    }

    /// Invisible hit volume padded around the outline
    fn picking_proxy(&self, spec: &LabelSpec, bounds: &AABB) -> Fragment {
        let size = bounds.size();
        let margin = self.layout.proxy_margin;
        let depth = spec.extrusion.max(size.z);

        Fragment::new(
            format!("{PROXY_NAME_PREFIX}{}", spec.id),
            FragmentKind::PickingProxy { label_id: spec.id.clone() },
            Mesh::cuboid(size.x + margin, size.y + margin, depth),
            Rc::new(Material::invisible(format!("proxyMaterial_{}", spec.id))),
        )
        .with_position(Vec3::new(0.0, bounds.center().y, bounds.min.z + depth * 0.5))
    }
}

impl<G: GlyphOutliner + std::fmt::Debug> std::fmt::Debug for LabelBuilder<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelBuilder")
            .field("outliner", &self.outliner)
            .field("font", &self.font)
            .field("layout", &self.layout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::text::{BlockGlyphOutliner, FontError, FontFuture};
    use approx::assert_relative_eq;

    fn builder() -> LabelBuilder<BlockGlyphOutliner> {
        LabelBuilder::new(BlockGlyphOutliner::new(), "builtin", LayoutConstants::default())
    }

    fn placed_z_span(fragment: &Fragment) -> (f32, f32) {
        let bounds = fragment.mesh.bounding_box().expect("geometry");
        let z = fragment.transform.position.z;
        (bounds.min.z + z, bounds.max.z + z)
    }

    #[test]
    fn test_blank_text_builds_nothing() {
        let mut builder = builder();
        for text in ["", "   ", "\t\n"] {
            let spec = LabelSpec::new("x", text);
            assert!(pollster::block_on(builder.build(&spec, 2.0)).expect("ok").is_none());
        }
    }

    #[test]
    fn test_emboss_stands_on_face() {
        let mut builder = builder();
        let spec = LabelSpec::new("x", "Hi").with_extrusion(1.0);
        let label = pollster::block_on(builder.build(&spec, 2.0)).expect("ok").expect("label");

        let (back, front) = placed_z_span(&label);
        assert_relative_eq!(back, 1.0);
        assert_relative_eq!(front, 2.0);
        assert_eq!(label.material.color, 0x333333);
    }

    #[test]
    fn test_engrave_front_face_below_surface_by_reveal() {
        let mut builder = builder();
        let spec = LabelSpec::new("x", "Hi").with_extrusion(1.0).with_mode(PlacementMode::Engrave);
        let label = pollster::block_on(builder.build(&spec, 2.0)).expect("ok").expect("label");

        let (back, front) = placed_z_span(&label);
        assert_relative_eq!(front, 0.8, epsilon = 1e-6);
        assert_relative_eq!(back, -0.2, epsilon = 1e-6);
        assert_eq!(label.material.color, 0xaaaaaa);
    }

    #[test]
    fn test_mesh_centered_then_moved_to_target_x() {
        let mut builder = builder();
        let spec = LabelSpec::new("phone", "555").with_position(12.0, -20.0);
        let label = pollster::block_on(builder.build(&spec, 2.0)).expect("ok").expect("label");

        let bounds = label.mesh.bounding_box().expect("geometry");
        assert_relative_eq!(bounds.min.x + bounds.max.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(label.transform.position, Vec3::new(12.0, -20.0, 1.0));
        assert_eq!(label.name, "text_phone");
    }

    #[test]
    fn test_proxy_is_padded_invisible_child() {
        let mut builder = builder();
        let spec = LabelSpec::new("x", "Hi").with_size(10.0).with_extrusion(1.0);
        let label = pollster::block_on(builder.build(&spec, 2.0)).expect("ok").expect("label");

        assert_eq!(label.children.len(), 1);
        let proxy = &label.children[0];
        assert!(proxy.kind.is_proxy());
        assert_eq!(proxy.kind.label_id(), Some("x"));
        assert!(!proxy.is_visible());

        let label_bounds = label.mesh.bounding_box().expect("geometry");
        let proxy_local = proxy.mesh.bounding_box().expect("geometry");
        let offset = proxy.transform.position;
        assert_relative_eq!(proxy_local.size().x, label_bounds.size().x + 2.0, epsilon = 1e-5);
        assert_relative_eq!(proxy_local.size().y, label_bounds.size().y + 2.0, epsilon = 1e-5);
        assert_relative_eq!(proxy_local.min.z + offset.z, label_bounds.min.z, epsilon = 1e-6);
        assert_relative_eq!(proxy_local.max.z + offset.z, label_bounds.max.z, epsilon = 1e-6);
        assert_relative_eq!(offset.x, 0.0);
    }

    #[test]
    fn test_explicit_color_wins() {
        let mut builder = builder();
        let spec = LabelSpec::new("x", "Hi").with_color(0xff0000);
        let label = pollster::block_on(builder.build(&spec, 2.0)).expect("ok").expect("label");
        assert_eq!(label.material.color, 0xff0000);
    }

    #[test]
    fn test_non_positive_size_rejected() {
        let mut builder = builder();
        let spec = LabelSpec::new("x", "Hi").with_size(0.0);
        let result = pollster::block_on(builder.build(&spec, 2.0));
        assert!(matches!(result, Err(SceneError::InvalidParameter { name: "size", .. })));
    }

    struct Unreachable;

    impl GlyphOutliner for Unreachable {
        type Font = ();

        fn load_font(&self, url: &str) -> FontFuture<()> {
            let url = url.to_string();
            Box::pin(async move { Err::<(), _>(FontError::FontUnavailable(url)) })
        }

        fn outline(&self, _: &str, _: &(), _: f32, _: f32) -> Result<GlyphOutline, FontError> {
            Err(FontError::OutlineFailed("no font".into()))
        }
    }

    #[test]
    fn test_font_failure_is_reported() {
        let mut builder = LabelBuilder::new(Unreachable, "https://fonts.invalid/x.json", LayoutConstants::default());
        let spec = LabelSpec::new("x", "Hi");
        let result = pollster::block_on(builder.build(&spec, 2.0));
        assert!(matches!(result, Err(SceneError::Font(FontError::FontUnavailable(_)))));
        assert!(!builder.font_ready());
    }

    #[test]
    fn test_spec_serde_uses_lowercase_modes() {
        let spec = LabelSpec::new("email", "a@b.c").with_mode(PlacementMode::Engrave);
        let text = toml::to_string(&spec).expect("serialize");
        assert!(text.contains("mode = \"engrave\""));
        assert!(!text.contains("color"));

        let parsed: LabelSpec = toml::from_str("id = \"phone\"\ntext = \"555\"").expect("parse");
        assert_eq!(parsed.size, 8.0);
        assert_eq!(parsed.mode, PlacementMode::Emboss);
    }
}
