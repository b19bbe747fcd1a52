use crate::model::{ModelGraph, Triangle};
use glam::{Mat4, Vec3};

/// Distance kept clear in front of the target so surface-mounted anchors do not hide themselves.
const SURFACE_EPSILON: f32 = 1e-3;

/// Moller-Trumbore ray/triangle test. `dir` does not need to be normalized; the returned `t` is in
/// units of `dir`.
pub fn ray_triangle_intersection(origin: Vec3, dir: Vec3, tri: &Triangle) -> Option<f32> {
    let [a, b, c] = tri.positions;
    let edge1 = b - a;
    let edge2 = c - a;
    let p = dir.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < 1e-8 {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(q) * inv_det;
    if t < 0.0 {
        return None;
    }
    Some(t)
}

pub fn ray_aabb_intersection(origin: Vec3, dir: Vec3, min: Vec3, max: Vec3) -> Option<(f32, Vec3)> {
    let mut t_min: f32 = 0.0;
    let mut t_max: f32 = f32::INFINITY;
    let origin_arr = origin.to_array();
    let dir_arr = dir.to_array();
    let min_arr = min.to_array();
    let max_arr = max.to_array();
    for i in 0..3 {
        let o = origin_arr[i];
        let d = dir_arr[i];
        if d.abs() < 1e-6 {
            if o < min_arr[i] || o > max_arr[i] {
                return None;
            }
        } else {
            let inv_d = 1.0 / d;
            let mut t1 = (min_arr[i] - o) * inv_d;
            let mut t2 = (max_arr[i] - o) * inv_d;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
            if t_min > t_max {
                return None;
            }
        }
    }
    if t_max < 0.0 {
        return None;
    }
    let t_hit = if t_min >= 0.0 { t_min } else { t_max };
    Some((t_hit, origin + dir * t_hit))
}

/// World-space geometry of the owning model, rebuilt whenever the model transform changes.
#[derive(Debug, Clone, Default)]
pub struct Occluder {
    triangles: Vec<Triangle>,
    min: Vec3,
    max: Vec3,
}

impl Occluder {
    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for tri in &triangles {
            for p in tri.positions {
                min = min.min(p);
                max = max.max(p);
            }
        }
        Self { triangles, min, max }
    }

    pub fn from_model(graph: &ModelGraph, model: Mat4) -> Self {
        Self::from_triangles(graph.world_triangles(model))
    }

    /// True when a model triangle sits on the segment between `eye` and `target`.
    pub fn is_occluded(&self, eye: Vec3, target: Vec3) -> bool {
        if self.triangles.is_empty() {
            return false;
        }
        let segment = target - eye;
        let length = segment.length();
        if length <= SURFACE_EPSILON {
            return false;
        }
        let dir = segment / length;
        let Some((entry, _)) = ray_aabb_intersection(eye, dir, self.min, self.max) else {
            return false;
        };
        if entry >= length - SURFACE_EPSILON {
            return false;
        }
        self.triangles
            .iter()
            .filter_map(|tri| ray_triangle_intersection(eye, dir, tri))
            .any(|t| t > SURFACE_EPSILON && t < length - SURFACE_EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::box_triangles;

    fn unit_box() -> Occluder {
        Occluder::from_triangles(box_triangles(Vec3::splat(-1.0), Vec3::splat(1.0), Vec3::ONE))
    }

    #[test]
    fn ray_hits_triangle_in_front() {
        let tri = Triangle {
            positions: [Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            color: Vec3::ONE,
        };
        let t = ray_triangle_intersection(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, &tri).expect("hit");
        assert!((t - 5.0).abs() < 1e-5);
        assert!(ray_triangle_intersection(Vec3::new(0.0, 0.0, 5.0), Vec3::Z, &tri).is_none());
    }

    #[test]
    fn point_behind_box_is_occluded() {
        let occluder = unit_box();
        let eye = Vec3::new(0.0, 0.0, 6.0);
        assert!(occluder.is_occluded(eye, Vec3::new(0.0, 0.0, -1.5)));
        assert!(occluder.is_occluded(eye, Vec3::ZERO), "inside the body counts as hidden");
    }

    #[test]
    fn point_on_near_face_is_visible() {
        let occluder = unit_box();
        let eye = Vec3::new(0.0, 0.0, 6.0);
        assert!(!occluder.is_occluded(eye, Vec3::new(0.2, 0.3, 1.0)));
        assert!(!occluder.is_occluded(eye, Vec3::new(3.0, 0.0, 0.0)));
    }
}
