//! Base and frame generation
//!
//! Produces the rectangular card body and the optional four-segment border
//! from [`CardParameters`]. Output depends only on the parameters and the
//! layout constants, so identical inputs give identical geometry.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::core::config::LayoutConstants;
use crate::foundation::math::Vec3;
use crate::render::material::{Material, BASE_COLOR, FRAME_COLOR};
use crate::render::primitives::Mesh;

use super::{Fragment, FragmentKind, FrameSide, SceneError, BASE_NAME};

/// Dimensions of the card in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardParameters {
    /// Extent along X
    pub width: f32,
    /// Extent along Y
    pub height: f32,
    /// Extent along Z; the front face sits at `depth / 2`
    pub depth: f32,
    /// Build the four border segments
    pub frame_enabled: bool,
    /// Border width, only checked when the frame is enabled
    pub frame_thickness: f32,
}

impl Default for CardParameters {
    fn default() -> Self {
        Self {
            width: 63.0,
            height: 88.0,
            depth: 2.0,
            frame_enabled: false,
            frame_thickness: 2.0,
        }
    }
}

impl CardParameters {
    /// Reject non-positive or non-finite dimensions
    pub fn validate(&self) -> Result<(), SceneError> {
        let mut checks = vec![("width", self.width), ("height", self.height), ("depth", self.depth)];
        if self.frame_enabled {
            checks.push(("frame_thickness", self.frame_thickness));
        }

        match checks.into_iter().find(|&(_, value)| !(value.is_finite() && value > 0.0)) {
            Some((name, value)) => Err(SceneError::InvalidParameter { name, value }),
            None => Ok(()),
        }
    }

    /// Half of the card depth, where the front face sits
    pub fn half_depth(&self) -> f32 {
        self.depth * 0.5
    }
}

/// Fragments produced by one [`SolidBuilder::build`]
#[derive(Debug, Clone)]
pub struct SolidParts {
    /// The card body
    pub base: Fragment,
    /// Either empty or exactly four segments (top, bottom, left, right)
    pub frame: Vec<Fragment>,
}

/// Builds base and frame fragments
#[derive(Debug, Clone, Default)]
pub struct SolidBuilder {
    layout: LayoutConstants,
}

impl SolidBuilder {
    /// Create a builder using the given placement constants
    pub fn new(layout: LayoutConstants) -> Self {
        Self { layout }
    }

    /// Build the base and, when enabled, the frame
    pub fn build(&self, params: &CardParameters) -> Result<SolidParts, SceneError> {
        params.validate()?;

        let base_material = Rc::new(
            Material::new("cardBaseMaterial", BASE_COLOR)
                .with_roughness(0.4)
                .with_metalness(0.1),
        );
        let base = Fragment::new(
            BASE_NAME,
            FragmentKind::Base,
            Mesh::cuboid(params.width, params.height, params.depth),
            base_material,
        );

        let frame = if params.frame_enabled {
            self.build_frame(params)
        } else {
            Vec::new()
        };

        log::debug!(
            "Built card solid {}x{}x{} mm with {} frame segments",
            params.width, params.height, params.depth, frame.len()
        );
        Ok(SolidParts { base, frame })
    }

    fn build_frame(&self, params: &CardParameters) -> Vec<Fragment> {
        let CardParameters { width, height, depth, frame_thickness: thickness, .. } = *params;
        let frame_depth = depth + self.layout.frame_clearance;

        // One material for all four segments
        let material = Rc::new(
            Material::new("frameMaterial", FRAME_COLOR)
                .with_roughness(0.3)
                .with_metalness(0.2),
        );

        FrameSide::ALL
            .iter()
            .map(|&side| {
                let (size, position) = match side {
                    FrameSide::Top => (
                        (width + 2.0 * thickness, thickness),
                        Vec3::new(0.0, height / 2.0 + thickness / 2.0, 0.0),
                    ),
                    FrameSide::Bottom => (
                        (width + 2.0 * thickness, thickness),
                        Vec3::new(0.0, -(height / 2.0 + thickness / 2.0), 0.0),
                    ),
                    FrameSide::Left => (
                        (thickness, height),
                        Vec3::new(-(width / 2.0 + thickness / 2.0), 0.0, 0.0),
                    ),
                    FrameSide::Right => (
                        (thickness, height),
                        Vec3::new(width / 2.0 + thickness / 2.0, 0.0, 0.0),
                    ),
                };
                Fragment::new(
                    side.name(),
                    FragmentKind::Frame(side),
                    Mesh::cuboid(size.0, size.1, frame_depth),
                    Rc::clone(&material),
                )
                .with_position(position)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collision::AABB;
    use approx::assert_relative_eq;

    fn placed_bounds(fragment: &Fragment) -> AABB {
        let local = fragment.mesh.bounding_box().expect("geometry");
        let offset = fragment.transform.position;
        AABB::new(local.min + offset, local.max + offset)
    }

    #[test]
    fn test_base_matches_dimensions() {
        let params = CardParameters { width: 85.0, height: 55.0, depth: 1.5, ..Default::default() };
        let parts = SolidBuilder::default().build(&params).expect("valid");

        assert!(parts.frame.is_empty());
        assert_eq!(parts.base.name, "cardBase");
        let bounds = placed_bounds(&parts.base);
        assert_relative_eq!(bounds.size(), Vec3::new(85.0, 55.0, 1.5));
        assert_relative_eq!(bounds.center(), Vec3::zeros());
    }

    #[test]
    fn test_frame_forms_closed_ring() {
        let params = CardParameters { frame_enabled: true, frame_thickness: 3.0, ..Default::default() };
        let parts = SolidBuilder::default().build(&params).expect("valid");
        assert_eq!(parts.frame.len(), 4);

        let names: Vec<_> = parts.frame.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["frameTop", "frameBottom", "frameLeft", "frameRight"]);

        let bounds: Vec<AABB> = parts.frame.iter().map(placed_bounds).collect();
        let outer_min = bounds.iter().fold(Vec3::repeat(f32::MAX), |acc, b| acc.inf(&b.min));
        let outer_max = bounds.iter().fold(Vec3::repeat(f32::MIN), |acc, b| acc.sup(&b.max));
        assert_relative_eq!(outer_max.x - outer_min.x, 63.0 + 6.0);
        assert_relative_eq!(outer_max.y - outer_min.y, 88.0 + 6.0);

        // Side segments meet the top/bottom segments exactly at the base edges
        let (top, left) = (&bounds[0], &bounds[2]);
        assert_relative_eq!(top.min.y, 44.0);
        assert_relative_eq!(left.max.y, 44.0);
        assert_relative_eq!(left.max.x, -31.5);
    }

    #[test]
    fn test_frame_depth_adds_clearance_and_shares_material() {
        let params = CardParameters { frame_enabled: true, ..Default::default() };
        let parts = SolidBuilder::default().build(&params).expect("valid");

        for segment in &parts.frame {
            let bounds = placed_bounds(segment);
            assert_relative_eq!(bounds.size().z, 2.5);
            assert!(Rc::ptr_eq(&segment.material, &parts.frame[0].material));
        }
        assert!(!Rc::ptr_eq(&parts.base.material, &parts.frame[0].material));
    }

    #[test]
    fn test_build_is_deterministic() {
        let params = CardParameters { frame_enabled: true, ..Default::default() };
        let builder = SolidBuilder::default();
        let first = builder.build(&params).expect("valid");
        let second = builder.build(&params).expect("valid");

        assert_eq!(first.base.mesh, second.base.mesh);
        for (a, b) in first.frame.iter().zip(&second.frame) {
            assert_eq!(a.mesh, b.mesh);
            assert_eq!(a.transform, b.transform);
        }
    }

    #[test]
    fn test_invalid_dimensions_rejected() {
        let builder = SolidBuilder::default();
        let zero_width = CardParameters { width: 0.0, ..Default::default() };
        assert!(matches!(
            builder.build(&zero_width),
            Err(SceneError::InvalidParameter { name: "width", .. })
        ));

        let thin_frame = CardParameters { frame_enabled: true, frame_thickness: -1.0, ..Default::default() };
        assert!(matches!(
            builder.build(&thin_frame),
            Err(SceneError::InvalidParameter { name: "frame_thickness", .. })
        ));

        // Thickness is ignored while the frame is off
        let unused = CardParameters { frame_thickness: 0.0, ..Default::default() };
        assert!(builder.build(&unused).is_ok());
    }
}
