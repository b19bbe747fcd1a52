use crate::animation::LightRig;
use crate::camera3d::Camera3D;
use crate::model::Triangle;
use egui::epaint::{Vertex, WHITE_UV};
use egui::{Color32, Mesh, Pos2};
use glam::{Vec2, Vec3};
use winit::dpi::PhysicalSize;

/// Brightest a lit surface may get before clamping.
const MAX_INTENSITY: f32 = 1.6;

/// A projected, lit triangle in physical pixels.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScreenTriangle {
    pub points: [Vec2; 3],
    pub depth: f32,
    pub color: Vec3,
}

/// Projects and lights world-space triangles, returned back-to-front for painter's ordering.
///
/// Triangles with a vertex behind the camera are dropped. Lighting is two-sided: the face normal is
/// flipped toward the eye so thin parts and glTF meshes with mixed winding still shade.
pub(crate) fn shade_triangles(
    triangles: &[Triangle],
    camera: &Camera3D,
    light: &LightRig,
    viewport: PhysicalSize<u32>,
) -> Vec<ScreenTriangle> {
    let mut out: Vec<ScreenTriangle> = triangles
        .iter()
        .filter_map(|tri| {
            let [a, b, c] = tri.positions.map(|p| camera.project_unclipped(p, viewport));
            let (a, b, c) = (a?, b?, c?);
            let mut normal = tri.normal();
            if normal == Vec3::ZERO {
                return None;
            }
            let centroid = tri.centroid();
            if normal.dot(camera.position - centroid) < 0.0 {
                normal = -normal;
            }
            let intensity = light.intensity(normal).clamp(0.0, MAX_INTENSITY);
            Some(ScreenTriangle {
                points: [a.0, b.0, c.0],
                depth: camera.position.distance(centroid),
                color: (tri.color * intensity).clamp(Vec3::ZERO, Vec3::ONE),
            })
        })
        .collect();
    out.sort_by(|lhs, rhs| rhs.depth.total_cmp(&lhs.depth));
    out
}

fn to_color32(color: Vec3) -> Color32 {
    let c = (color * 255.0).round();
    Color32::from_rgb(c.x as u8, c.y as u8, c.z as u8)
}

/// Packs shaded triangles into one egui mesh in points.
pub(crate) fn build_mesh(triangles: &[ScreenTriangle], pixels_per_point: f32) -> Mesh {
    let scale = 1.0 / pixels_per_point.max(f32::EPSILON);
    let mut mesh = Mesh::default();
    mesh.vertices.reserve(triangles.len() * 3);
    mesh.indices.reserve(triangles.len() * 3);
    for tri in triangles {
        let color = to_color32(tri.color);
        let base = mesh.vertices.len() as u32;
        for point in tri.points {
            let pos = Pos2::new(point.x * scale, point.y * scale);
            mesh.vertices.push(Vertex { pos, uv: WHITE_UV, color });
        }
        mesh.add_triangle(base, base + 1, base + 2);
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::box_triangles;
    use crate::params::AnimationParams;

    fn camera() -> Camera3D {
        Camera3D::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, 45f32.to_radians(), 0.1, 100.0)
    }

    #[test]
    fn triangles_come_back_far_to_near() {
        let mut triangles = box_triangles(Vec3::splat(-1.0), Vec3::splat(1.0), Vec3::ONE);
        triangles.extend(box_triangles(Vec3::new(-0.5, -0.5, 3.0), Vec3::new(0.5, 0.5, 4.0), Vec3::ONE));
        let light = LightRig::from_params(&AnimationParams::default());
        let shaded = shade_triangles(&triangles, &camera(), &light, PhysicalSize::new(800, 600));
        assert_eq!(shaded.len(), triangles.len());
        assert!(shaded.windows(2).all(|pair| pair[0].depth >= pair[1].depth));
    }

    #[test]
    fn geometry_behind_the_eye_is_dropped() {
        let triangles = box_triangles(Vec3::new(-1.0, -1.0, 12.0), Vec3::new(1.0, 1.0, 14.0), Vec3::ONE);
        let light = LightRig::from_params(&AnimationParams::default());
        assert!(shade_triangles(&triangles, &camera(), &light, PhysicalSize::new(800, 600)).is_empty());
    }

    #[test]
    fn ambient_only_light_is_flat() {
        let params = AnimationParams {
            directional_light_intensity: 0.0,
            ambient_light_intensity: 0.5,
            ..AnimationParams::default()
        };
        let light = LightRig::from_params(&params);
        let triangles = box_triangles(Vec3::splat(-1.0), Vec3::splat(1.0), Vec3::ONE);
        let shaded = shade_triangles(&triangles, &camera(), &light, PhysicalSize::new(800, 600));
        assert!(shaded.iter().all(|tri| (tri.color - Vec3::splat(0.5)).length() < 1e-5));
        let mesh = build_mesh(&shaded, 2.0);
        assert_eq!(mesh.vertices.len(), shaded.len() * 3);
        assert_eq!(mesh.indices.len(), shaded.len() * 3);
    }
}
