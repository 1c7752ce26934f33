//! Primitive shapes and intersection algorithms
//!
//! Provides rays, planes and axis-aligned bounding boxes with the
//! intersection tests the picker needs.

use crate::foundation::math::{Mat4, Point3, Vec3, Vec4};

/// Rays whose direction is this close to parallel with a plane never hit it
const PARALLEL_EPSILON: f32 = 1e-6;

/// A ray for ray casting and picking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec3,
    /// The direction of the ray
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and a normalized direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Build a world-space ray through a point in normalized device coordinates
    ///
    /// `inverse_view_projection` unprojects NDC into world space; the ray
    /// starts at `camera_position` and passes through the far-plane point.
    /// Returns `None` when the unprojection degenerates.
    pub fn from_ndc(
        ndc_x: f32,
        ndc_y: f32,
        inverse_view_projection: &Mat4,
        camera_position: Vec3,
    ) -> Option<Self> {
        let unproject = |ndc_z: f32| -> Option<Vec3> {
            let world = inverse_view_projection * Vec4::new(ndc_x, ndc_y, ndc_z, 1.0);
            (world.w.abs() > f32::EPSILON).then(|| world.xyz() / world.w)
        };

        let near = unproject(-1.0)?;
        let far = unproject(1.0)?;
        let direction = far - near;
        if direction.norm_squared() <= f32::EPSILON {
            return None;
        }
        Some(Self::new(camera_position, direction))
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Express the ray in another coordinate frame
    ///
    /// The direction is not renormalized, so a parameter `t` found in the
    /// target frame addresses the same point as `t` on the original ray.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self {
            origin: matrix.transform_point(&Point3::from(self.origin)).coords,
            direction: matrix.transform_vector(&self.direction),
        }
    }

    /// Intersect the ray with a plane
    ///
    /// Returns `None` when the ray is parallel to the plane or the plane
    /// lies behind the origin.
    pub fn intersect_plane(&self, plane: &Plane) -> Option<Vec3> {
        let denominator = plane.normal.dot(&self.direction);
        if denominator.abs() < PARALLEL_EPSILON {
            return None;
        }
        let t = -plane.distance_to_point(self.origin) / denominator;
        (t >= 0.0).then(|| self.point_at(t))
    }
}

/// Convert a pointer position in pixels to normalized device coordinates
///
/// Y is flipped so that the top of the viewport maps to +1.
pub fn screen_to_ndc(screen_x: f32, screen_y: f32, width: f32, height: f32) -> (f32, f32) {
    (
        (screen_x / width) * 2.0 - 1.0,
        -(screen_y / height) * 2.0 + 1.0,
    )
}

/// Plane defined by normal and distance from origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (normalized)
    pub normal: Vec3,
    /// Signed constant: points `p` on the plane satisfy `normal · p + distance = 0`
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal: normal.normalize(), distance }
    }

    /// Create the plane with the given normal that passes through `point`
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize();
        let distance = -normal.dot(&point);
        Self { normal, distance }
    }
    
    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }
}

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }
    
    /// Smallest box containing every point, `None` for an empty set
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = *points.next()?;
        Some(points.fold(Self::new(first, first), |bounds, point| Self {
            min: bounds.min.inf(point),
            max: bounds.max.sup(point),
        }))
    }
    
    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
    
    /// Full edge lengths of the AABB
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
    
    /// Test ray intersection with this AABB using slab method
    /// Returns the ray parameter of the entry point if the ray intersects, None otherwise
    /// Based on "An Efficient and Robust Ray–Box Intersection Algorithm"
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inv_dir = Vec3::new(
            if ray.direction.x != 0.0 { 1.0 / ray.direction.x } else { f32::INFINITY },
            if ray.direction.y != 0.0 { 1.0 / ray.direction.y } else { f32::INFINITY },
            if ray.direction.z != 0.0 { 1.0 / ray.direction.z } else { f32::INFINITY },
        );

        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        for axis in 0..3 {
            if ray.direction[axis] == 0.0 {
                // Parallel to this slab: must already be inside it
                if ray.origin[axis] < self.min[axis] || ray.origin[axis] > self.max[axis] {
                    return None;
                }
                continue;
            }
            let t1 = (self.min[axis] - ray.origin[axis]) * inv_dir[axis];
            let t2 = (self.max[axis] - ray.origin[axis]) * inv_dir[axis];
            t_enter = t_enter.max(t1.min(t2));
            t_exit = t_exit.min(t1.max(t2));
        }
        
        if t_exit >= t_enter && t_exit >= 0.0 {
            // Entry point distance, or 0 if we're inside the box
            Some(t_enter.max(0.0))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    
    #[test]
    fn test_aabb_from_points() {
        let points = [Vec3::new(1.0, -2.0, 0.0), Vec3::new(-1.0, 4.0, 0.5)];
        let bounds = AABB::from_points(points.iter()).expect("non-empty");
        assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 4.0, 0.5));
        assert!(AABB::from_points([].iter()).is_none());
    }

    #[test]
    fn test_ray_hits_box_entry_distance() {
        let aabb = AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(aabb.intersect_ray(&ray).expect("hit"), 9.0);
    }

    #[test]
    fn test_axis_parallel_ray_outside_slab_misses() {
        let aabb = AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let ray = Ray::new(Vec3::new(5.0, 0.0, 10.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(aabb.intersect_ray(&ray).is_none());
    }

    #[test]
    fn test_box_behind_ray_misses() {
        let aabb = AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect_ray(&ray).is_none());
    }

    #[test]
    fn test_plane_intersection_and_parallel_miss() {
        let plane = Plane::from_point_normal(Vec3::new(0.0, 0.0, 2.0), Vec3::z());
        let ray = Ray::new(Vec3::new(3.0, 4.0, 10.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = ray.intersect_plane(&plane).expect("hit");
        assert_relative_eq!(hit, Vec3::new(3.0, 4.0, 2.0));

        let parallel = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::x());
        assert!(parallel.intersect_plane(&plane).is_none());
    }

    #[test]
    fn test_transformed_ray_preserves_parameter() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, -1.0));
        let to_local = Mat4::new_translation(&Vec3::new(-5.0, 0.0, 0.0));
        let local = ray.transformed(&to_local);
        assert_relative_eq!(local.point_at(4.0), ray.point_at(4.0) + Vec3::new(-5.0, 0.0, 0.0));
    }

    #[test]
    fn test_ray_from_ndc_center_looks_forward() {
        let projection = Mat4::new_perspective(1.0, std::f32::consts::FRAC_PI_4, 0.1, 100.0);
        let eye = Point3::new(0.0, 0.0, 150.0);
        let view = Mat4::look_at_rh(&eye, &Point3::origin(), &Vec3::y());
        let inverse = (projection * view).try_inverse().expect("invertible");

        let ray = Ray::from_ndc(0.0, 0.0, &inverse, eye.coords).expect("ray");
        assert_relative_eq!(ray.direction, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-4);
    }

    #[test]
    fn test_screen_to_ndc_corners() {
        assert_eq!(screen_to_ndc(0.0, 0.0, 800.0, 600.0), (-1.0, 1.0));
        assert_eq!(screen_to_ndc(800.0, 600.0, 800.0, 600.0), (1.0, -1.0));
    }
}
