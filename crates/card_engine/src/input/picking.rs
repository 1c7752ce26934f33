//! Label picking and plane-constrained dragging
//!
//! Rays are tested against the invisible picking proxies of the label
//! fragments, never against the glyph geometry itself. A drag moves the
//! selected label across a plane parallel to the card face, so its depth
//! only changes when the card itself is rebuilt.

use crate::events::{Event, EventArg, EventSystem, EventType};
use crate::foundation::math::{Point3, Vec3};
use crate::physics::collision::{Plane, Ray};
use crate::scene::{CardAssembly, FragmentId, SceneError};

/// Active drag
#[derive(Debug, Clone, Copy)]
struct DragState {
    fragment: FragmentId,
    plane: Plane,
    /// World-space offset between the grab point and the fragment origin
    offset: Vec3,
    /// Card-local depth pinned for the whole drag
    depth: f32,
}

/// Ray-based label selection and dragging
#[derive(Debug, Clone)]
pub struct Picker {
    draggables: Vec<FragmentId>,
    drag: Option<DragState>,
    camera_enabled: bool,
}

impl Default for Picker {
    fn default() -> Self {
        Self::new()
    }
}

impl Picker {
    /// Create a picker with nothing to drag
    pub fn new() -> Self {
        Self {
            draggables: Vec::new(),
            drag: None,
            camera_enabled: true,
        }
    }

    /// Reload the draggable set after an assembly mutation
    ///
    /// A drag whose fragment no longer exists is cancelled. A surviving drag
    /// is re-anchored, so a card rebuild that moved the label to a new face
    /// depth carries the drag plane along with it.
    pub fn refresh(&mut self, assembly: &CardAssembly, events: &mut EventSystem) {
        self.draggables = assembly.get_draggable_fragments();

        let Some(drag) = self.drag else {
            return;
        };
        let anchor = self
            .draggables
            .contains(&drag.fragment)
            .then(|| Self::anchor(assembly, drag.fragment))
            .flatten();

        match anchor {
            Some((_, plane, depth)) => {
                if (depth - drag.depth).abs() > f32::EPSILON {
                    log::debug!("Drag re-pinned to depth {} (was {})", depth, drag.depth);
                }
                self.drag = Some(DragState {
                    plane,
                    offset: Self::in_plane(drag.offset, &plane),
                    depth,
                    ..drag
                });
            }
            None => {
                log::debug!("Drag cancelled: fragment {:?} was replaced", drag.fragment);
                self.drag = None;
                self.set_camera_enabled(true, events);
            }
        }
    }

    /// World origin, drag plane and card-local depth of a label
    fn anchor(assembly: &CardAssembly, fragment: FragmentId) -> Option<(Vec3, Plane, f32)> {
        let graph = assembly.graph();
        let origin = graph.world_matrix(fragment)?.transform_point(&Point3::origin()).coords;
        let depth = graph.transform(fragment)?.position.z;
        Some((origin, Plane::from_point_normal(origin, assembly.face_normal()), depth))
    }

    /// Component of `offset` lying in `plane`
    fn in_plane(offset: Vec3, plane: &Plane) -> Vec3 {
        offset - plane.normal * offset.dot(&plane.normal)
    }

    /// Fragments currently considered for hit-testing
    pub fn draggables(&self) -> &[FragmentId] {
        &self.draggables
    }

    /// Fragment being dragged
    pub fn selected(&self) -> Option<FragmentId> {
        self.drag.map(|drag| drag.fragment)
    }

    /// True while a label is held
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Whether camera/orbit interaction is allowed
    pub fn camera_enabled(&self) -> bool {
        self.camera_enabled
    }

    /// Nearest label whose proxy the ray hits
    ///
    /// Returns the label fragment, never the proxy. Labels without a proxy
    /// are tested against their own geometry.
    pub fn pick(&self, assembly: &CardAssembly, ray: &Ray) -> Option<FragmentId> {
        self.nearest_hit(assembly, ray).map(|(label, _)| label)
    }

    /// Nearest label under `ray` with the ray parameter of the hit
    fn nearest_hit(&self, assembly: &CardAssembly, ray: &Ray) -> Option<(FragmentId, f32)> {
        let graph = assembly.graph();

        let mut nearest: Option<(FragmentId, f32)> = None;
        for &label in &self.draggables {
            let proxies: Vec<FragmentId> = graph
                .children(label)
                .iter()
                .copied()
                .filter(|&child| graph.node(child).is_some_and(|node| node.kind.is_proxy()))
                .collect();
            let targets = if proxies.is_empty() { vec![label] } else { proxies };

            for target in targets {
                let Some(t) = Self::hit_distance(assembly, target, ray) else {
                    continue;
                };
                if nearest.map_or(true, |(_, best)| t < best) {
                    nearest = Some((label, t));
                }
            }
        }
        nearest
    }

    /// Ray parameter where `ray` enters the local bounds of `target`
    fn hit_distance(assembly: &CardAssembly, target: FragmentId, ray: &Ray) -> Option<f32> {
        let graph = assembly.graph();
        let bounds = graph.mesh(target)?.bounding_box()?;
        let to_local = graph.world_matrix(target)?.try_inverse()?;
        bounds.intersect_ray(&ray.transformed(&to_local))
    }

    /// Label under the pointer while nothing is held
    pub fn hover(&self, assembly: &CardAssembly, ray: &Ray) -> Option<FragmentId> {
        if self.is_dragging() {
            return None;
        }
        self.pick(assembly, ray)
    }

    /// Select the nearest label under `ray` and start dragging it
    ///
    /// Ignored while a drag is already in progress.
    pub fn on_pointer_down(&mut self, assembly: &CardAssembly, ray: &Ray, events: &mut EventSystem) -> Option<FragmentId> {
        if self.is_dragging() {
            return None;
        }

        let (fragment, t) = self.nearest_hit(assembly, ray)?;
        let (origin, plane, depth) = Self::anchor(assembly, fragment)?;

        // A ray grazing the face misses the plane; grab at the proxy hit instead
        let grab = ray.intersect_plane(&plane).unwrap_or_else(|| ray.point_at(t));

        self.drag = Some(DragState {
            fragment,
            plane,
            offset: Self::in_plane(grab - origin, &plane),
            depth,
        });

        let label_id = assembly.label_id(fragment).unwrap_or_default().to_string();
        log::debug!("Selected label '{}'", label_id);
        events.send(
            Event::new(EventType::LabelSelected)
                .with_arg("fragment", EventArg::Fragment(fragment))
                .with_arg("label_id", EventArg::LabelId(label_id)),
        );
        self.set_camera_enabled(false, events);
        Some(fragment)
    }

    /// Move the held label to follow `ray` across the drag plane
    ///
    /// Returns the new card-local position, or `None` when nothing is held
    /// or the ray misses the plane.
    pub fn on_pointer_move(
        &mut self,
        assembly: &mut CardAssembly,
        ray: &Ray,
        events: &mut EventSystem,
    ) -> Result<Option<Vec3>, SceneError> {
        let Some(drag) = self.drag else {
            return Ok(None);
        };
        let Some(hit) = ray.intersect_plane(&drag.plane) else {
            return Ok(None);
        };

        let world_target = hit - drag.offset;
        let graph = assembly.graph();
        let parent = graph
            .parent(drag.fragment)
            .ok_or(SceneError::UnknownFragment(drag.fragment))?;
        let to_parent = graph
            .world_matrix(parent)
            .and_then(|matrix| matrix.try_inverse())
            .ok_or(SceneError::UnknownFragment(parent))?;

        let mut position = to_parent.transform_point(&Point3::from(world_target)).coords;
        position.z = drag.depth;
        assembly.set_fragment_position(drag.fragment, position)?;

        let label_id = assembly.label_id(drag.fragment).unwrap_or_default().to_string();
        events.send(
            Event::new(EventType::LabelDragged)
                .with_arg("fragment", EventArg::Fragment(drag.fragment))
                .with_arg("label_id", EventArg::LabelId(label_id))
                .with_arg("position", EventArg::Position(position)),
        );
        Ok(Some(position))
    }

    /// Release the held label and resume camera interaction
    pub fn on_pointer_up(&mut self, assembly: &CardAssembly, events: &mut EventSystem) -> Option<FragmentId> {
        let released = self.drag.take().map(|drag| drag.fragment);

        if let Some(fragment) = released {
            let label_id = assembly.label_id(fragment).unwrap_or_default().to_string();
            let mut event = Event::new(EventType::LabelReleased)
                .with_arg("fragment", EventArg::Fragment(fragment))
                .with_arg("label_id", EventArg::LabelId(label_id.clone()));
            if let Some(transform) = assembly.graph().transform(fragment) {
                event = event.with_arg("position", EventArg::Position(transform.position));
            }
            events.send(event);
            log::debug!("Released label '{}'", label_id);
        }
        self.set_camera_enabled(true, events);
        released
    }

    fn set_camera_enabled(&mut self, enabled: bool, events: &mut EventSystem) {
        if self.camera_enabled != enabled {
            self.camera_enabled = enabled;
            events.send(
                Event::new(EventType::CameraControlChanged).with_arg("enabled", EventArg::Enabled(enabled)),
            );
        }
    }
}
