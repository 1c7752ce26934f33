//! Card assembly
//!
//! Owns the base, the optional frame and one fragment per label id, and
//! replaces them as parameters change. Every replacement is built before
//! the old fragment is touched, so a failed build leaves the previous
//! state in place.

use crate::core::config::LayoutConstants;
use crate::foundation::math::{Transform, Vec3};
use crate::render::text::{GlyphOutliner, LabelBuilder, LabelSpec, PlacementMode};

use super::{
    CardParameters, Fragment, FragmentId, ResourceCounts, SceneError, SceneGraph, SolidBuilder,
    SolidParts,
};

/// Bookkeeping for one live label
#[derive(Debug, Clone)]
struct LabelSlot {
    id: String,
    fragment: FragmentId,
    mode: PlacementMode,
    extrusion: f32,
}

/// Scene node owning every fragment of the card
#[derive(Debug)]
pub struct CardAssembly {
    graph: SceneGraph,
    params: CardParameters,
    solid_builder: SolidBuilder,
    layout: LayoutConstants,
    base: FragmentId,
    frame: Vec<FragmentId>,
    labels: Vec<LabelSlot>,
}

impl CardAssembly {
    /// Build the initial base and frame
    pub fn new(params: CardParameters, layout: LayoutConstants) -> Result<Self, SceneError> {
        let solid_builder = SolidBuilder::new(layout);
        let parts = solid_builder.build(&params)?;

        let mut graph = SceneGraph::new();
        let (base, frame) = Self::insert_solid(&mut graph, parts)?;

        log::info!("Card assembly created ({}x{}x{} mm)", params.width, params.height, params.depth);
        Ok(Self {
            graph,
            params,
            solid_builder,
            layout,
            base,
            frame,
            labels: Vec::new(),
        })
    }

    fn insert_solid(graph: &mut SceneGraph, parts: SolidParts) -> Result<(FragmentId, Vec<FragmentId>), SceneError> {
        let root = graph.root();
        let base = graph.insert(root, parts.base)?;
        let frame = parts
            .frame
            .into_iter()
            .map(|segment| graph.insert(root, segment))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((base, frame))
    }

    /// Current card parameters
    pub fn params(&self) -> &CardParameters {
        &self.params
    }

    /// Placement constants in use
    pub fn layout(&self) -> &LayoutConstants {
        &self.layout
    }

    /// Underlying fragment arena
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// The base fragment
    pub fn base(&self) -> FragmentId {
        self.base
    }

    /// Frame segments, empty when the frame is off
    pub fn frame(&self) -> &[FragmentId] {
        &self.frame
    }

    /// Replace base and frame
    ///
    /// Invalid parameters are rejected before anything is disposed. When
    /// the depth changes, live labels keep their x/y and get a new z from
    /// their placement mode.
    pub fn set_card_parameters(&mut self, params: CardParameters) -> Result<(), SceneError> {
        let parts = match self.solid_builder.build(&params) {
            Ok(parts) => parts,
            Err(err) => {
                log::warn!("Rejected card parameters: {}", err);
                return Err(err);
            }
        };

        // Release the old generation before inserting the new one
        self.graph.dispose(self.base)?;
        for segment in self.frame.drain(..) {
            self.graph.dispose(segment)?;
        }
        let (base, frame) = Self::insert_solid(&mut self.graph, parts)?;
        self.base = base;
        self.frame = frame;

        let depth_changed = (params.depth - self.params.depth).abs() > f32::EPSILON;
        self.params = params;
        if depth_changed {
            self.replace_label_depths()?;
        }

        log::debug!("Card parameters applied: {:?}", self.params);
        Ok(())
    }

    fn replace_label_depths(&mut self) -> Result<(), SceneError> {
        let half_depth = self.params.half_depth();
        for slot in &self.labels {
            let mut position = self
                .graph
                .transform(slot.fragment)
                .ok_or(SceneError::UnknownFragment(slot.fragment))?
                .position;
            position.z = slot.mode.placement_z(half_depth, slot.extrusion, self.layout.engrave_reveal);
            self.graph.set_position(slot.fragment, position)?;
        }
        Ok(())
    }

    /// Build and install the label for `spec.id`
    ///
    /// Blank text removes the label. Build errors leave any existing
    /// fragment for the id untouched.
    pub async fn set_label<G: GlyphOutliner>(
        &mut self,
        builder: &mut LabelBuilder<G>,
        spec: &LabelSpec,
    ) -> Result<Option<FragmentId>, SceneError> {
        let fragment = builder.build(spec, self.params.depth).await?;
        self.replace_label(spec, fragment)
    }

    /// Install an already built label fragment, or remove the label on `None`
    ///
    /// A replaced label keeps its position in the draggable order.
    pub fn replace_label(&mut self, spec: &LabelSpec, fragment: Option<Fragment>) -> Result<Option<FragmentId>, SceneError> {
        let index = self.labels.iter().position(|slot| slot.id == spec.id);
        if let Some(index) = index {
            let old = self.labels.remove(index);
            self.graph.dispose(old.fragment)?;
        }

        let Some(fragment) = fragment else {
            if index.is_some() {
                log::debug!("Removed label '{}'", spec.id);
            }
            return Ok(None);
        };

        let id = self.graph.insert(self.graph.root(), fragment)?;
        let slot = LabelSlot {
            id: spec.id.clone(),
            fragment: id,
            mode: spec.mode,
            extrusion: spec.extrusion,
        };
        match index {
            Some(index) => self.labels.insert(index, slot),
            None => self.labels.push(slot),
        }
        Ok(Some(id))
    }

    /// Remove the label for `id`, if present
    pub fn remove_label(&mut self, id: &str) -> Result<bool, SceneError> {
        let Some(index) = self.labels.iter().position(|slot| slot.id == id) else {
            return Ok(false);
        };
        let slot = self.labels.remove(index);
        self.graph.dispose(slot.fragment)?;
        Ok(true)
    }

    /// Label fragments in first-insertion order of their ids
    pub fn get_draggable_fragments(&self) -> Vec<FragmentId> {
        self.labels.iter().map(|slot| slot.fragment).collect()
    }

    /// Live fragment for a label id
    pub fn label_fragment(&self, id: &str) -> Option<FragmentId> {
        self.labels.iter().find(|slot| slot.id == id).map(|slot| slot.fragment)
    }

    /// Label id owning a label fragment
    pub fn label_id(&self, fragment: FragmentId) -> Option<&str> {
        self.labels
            .iter()
            .find(|slot| slot.fragment == fragment)
            .map(|slot| slot.id.as_str())
    }

    /// Top-level fragments: base, frame segments, then labels
    pub fn fragments(&self) -> Vec<FragmentId> {
        std::iter::once(self.base)
            .chain(self.frame.iter().copied())
            .chain(self.labels.iter().map(|slot| slot.fragment))
            .collect()
    }

    /// Move a fragment within the card
    pub fn set_fragment_position(&mut self, id: FragmentId, position: Vec3) -> Result<(), SceneError> {
        self.graph.set_position(id, position)
    }

    /// Place the whole card in the world
    pub fn set_transform(&mut self, transform: Transform) -> Result<(), SceneError> {
        self.graph.set_transform(self.graph.root(), transform)
    }

    /// Card face normal in world space
    pub fn face_normal(&self) -> Vec3 {
        self.graph
            .transform(self.graph.root())
            .map_or_else(Vec3::z, |root| root.rotation * Vec3::z())
    }

    /// Live resource totals
    pub fn resource_counts(&self) -> ResourceCounts {
        self.graph.resource_counts()
    }

    /// Dispose every owned fragment; returns how many were released
    pub fn teardown(mut self) -> Result<usize, SceneError> {
        let released = self.graph.dispose(self.graph.root())?;
        self.labels.clear();
        self.frame.clear();
        log::info!("Card assembly torn down ({} fragments released)", released);
        Ok(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::text::{BlockGlyphOutliner, FontError, FontFuture, GlyphOutline};
    use approx::assert_relative_eq;

    fn assembly() -> CardAssembly {
        CardAssembly::new(CardParameters::default(), LayoutConstants::default()).expect("valid")
    }

    fn builder() -> LabelBuilder<BlockGlyphOutliner> {
        LabelBuilder::new(BlockGlyphOutliner::new(), "builtin", LayoutConstants::default())
    }

    fn framed() -> CardParameters {
        CardParameters { frame_enabled: true, ..Default::default() }
    }

    #[test]
    fn test_repeated_identical_update_does_not_leak() {
        let mut card = assembly();
        card.set_card_parameters(framed()).expect("valid");
        let counts = card.resource_counts();
        assert_eq!(counts, ResourceCounts { fragments: 5, geometries: 5, materials: 2 });

        let base_mesh = card.graph().mesh(card.base()).cloned();
        for _ in 0..3 {
            card.set_card_parameters(framed()).expect("valid");
            assert_eq!(card.resource_counts(), counts);
        }
        assert_eq!(card.graph().mesh(card.base()).cloned(), base_mesh);
    }

    #[test]
    fn test_frame_is_all_or_nothing() {
        let mut card = assembly();
        assert!(card.frame().is_empty());
        card.set_card_parameters(framed()).expect("valid");
        assert_eq!(card.frame().len(), 4);
        card.set_card_parameters(CardParameters::default()).expect("valid");
        assert!(card.frame().is_empty());
        assert_eq!(card.resource_counts(), ResourceCounts { fragments: 1, geometries: 1, materials: 1 });
    }

    #[test]
    fn test_invalid_parameters_keep_previous_state() {
        let mut card = assembly();
        card.set_card_parameters(framed()).expect("valid");
        let base = card.base();

        let bad = CardParameters { depth: -2.0, ..framed() };
        assert!(matches!(card.set_card_parameters(bad), Err(SceneError::InvalidParameter { name: "depth", .. })));
        assert_eq!(card.base(), base);
        assert_eq!(card.frame().len(), 4);
        assert_eq!(card.params().depth, 2.0);
    }

    #[test]
    fn test_label_round_trip_removes_fragment() {
        let mut card = assembly();
        let mut labels = builder();
        let spec = LabelSpec::new("x", "Hi");

        let id = pollster::block_on(card.set_label(&mut labels, &spec)).expect("ok").expect("built");
        assert_eq!(card.get_draggable_fragments(), vec![id]);
        assert_eq!(card.label_id(id), Some("x"));

        let removed = pollster::block_on(card.set_label(&mut labels, &spec.clone().with_text("")));
        assert!(removed.expect("ok").is_none());
        assert!(card.get_draggable_fragments().is_empty());
        assert!(card.label_fragment("x").is_none());
        // Only the base remains
        assert_eq!(card.resource_counts(), ResourceCounts { fragments: 1, geometries: 1, materials: 1 });
    }

    #[test]
    fn test_one_fragment_per_id_and_stable_order() {
        let mut card = assembly();
        let mut labels = builder();
        for id in ["fullName", "phone", "email"] {
            pollster::block_on(card.set_label(&mut labels, &LabelSpec::new(id, id))).expect("ok");
        }
        let before = card.get_draggable_fragments();
        assert_eq!(card.get_draggable_fragments(), before);

        let replaced = pollster::block_on(card.set_label(&mut labels, &LabelSpec::new("phone", "555")))
            .expect("ok")
            .expect("built");
        let after = card.get_draggable_fragments();
        assert_eq!(after.len(), 3);
        assert_eq!(after[0], before[0]);
        assert_eq!(after[1], replaced);
        assert_eq!(after[2], before[2]);
        assert!(!card.graph().contains(before[1]));
    }

    #[test]
    fn test_depth_change_replaces_label_z() {
        let mut card = assembly();
        let mut labels = builder();
        let emboss = LabelSpec::new("a", "A").with_position(5.0, 7.0);
        let engrave = LabelSpec::new("b", "B").with_mode(PlacementMode::Engrave).with_extrusion(0.5);
        let a = pollster::block_on(card.set_label(&mut labels, &emboss)).expect("ok").expect("built");
        let b = pollster::block_on(card.set_label(&mut labels, &engrave)).expect("ok").expect("built");

        card.set_card_parameters(CardParameters { depth: 4.0, ..Default::default() }).expect("valid");

        let a_pos = card.graph().transform(a).expect("live").position;
        let b_pos = card.graph().transform(b).expect("live").position;
        assert_relative_eq!(a_pos, Vec3::new(5.0, 7.0, 2.0));
        assert_relative_eq!(b_pos.z, 2.0 - 0.5 - 0.2, epsilon = 1e-6);
    }

    struct Broken;

    impl GlyphOutliner for Broken {
        type Font = ();

        fn load_font(&self, _: &str) -> FontFuture<()> {
            Box::pin(async { Ok::<(), FontError>(()) })
        }

        fn outline(&self, _: &str, _: &(), _: f32, _: f32) -> Result<GlyphOutline, FontError> {
            Err(FontError::OutlineFailed("tessellation failed".into()))
        }
    }

    #[test]
    fn test_failed_build_keeps_existing_label() {
        let mut card = assembly();
        let mut good = builder();
        let mut bad = LabelBuilder::new(Broken, "builtin", LayoutConstants::default());
        let spec = LabelSpec::new("x", "Hi");

        let id = pollster::block_on(card.set_label(&mut good, &spec)).expect("ok").expect("built");
        let result = pollster::block_on(card.set_label(&mut bad, &spec.clone().with_text("Bye")));

        assert!(matches!(result, Err(SceneError::Font(FontError::OutlineFailed(_)))));
        assert_eq!(card.get_draggable_fragments(), vec![id]);
        assert!(card.graph().contains(id));
    }

    #[test]
    fn test_teardown_releases_everything_once() {
        let mut card = assembly();
        card.set_card_parameters(framed()).expect("valid");
        let mut labels = builder();
        pollster::block_on(card.set_label(&mut labels, &LabelSpec::new("x", "Hi"))).expect("ok");

        // base + 4 frame + label + proxy
        assert_eq!(card.teardown().expect("teardown"), 7);
    }

    #[test]
    fn test_fragments_order_and_face_normal() {
        let mut card = assembly();
        card.set_card_parameters(framed()).expect("valid");
        let fragments = card.fragments();
        assert_eq!(fragments.len(), 5);
        assert_eq!(fragments[0], card.base());

        assert_relative_eq!(card.face_normal(), Vec3::z());
        let turned = Transform::from_position_rotation(
            Vec3::zeros(),
            crate::foundation::math::Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_2),
        );
        card.set_transform(turned).expect("root");
        assert_relative_eq!(card.face_normal(), Vec3::x(), epsilon = 1e-6);
    }
}
