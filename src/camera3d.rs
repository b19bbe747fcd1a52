use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use winit::dpi::PhysicalSize;

const DEFAULT_UP: Vec3 = Vec3::Y;
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Perspective look-at camera.
#[derive(Debug, Clone)]
pub struct Camera3D {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera3D {
    pub fn new(position: Vec3, target: Vec3, fov_y_radians: f32, near: f32, far: f32) -> Self {
        Self { position, target, up: DEFAULT_UP, fov_y_radians, near, far }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_radians, aspect.max(0.0001), self.near, self.far)
    }

    pub fn view_projection(&self, viewport: PhysicalSize<u32>) -> Mat4 {
        let aspect = if viewport.height > 0 { viewport.width as f32 / viewport.height as f32 } else { 1.0 };
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// Projects a world-space point to pixel coordinates (origin top-left).
    ///
    /// Returns `None` for points behind the camera or outside the viewport rectangle.
    pub fn project_point(&self, point: Vec3, viewport: PhysicalSize<u32>) -> Option<Vec2> {
        let (screen, ndc) = self.project_unclipped(point, viewport)?;
        if ndc.x.abs() > 1.0 || ndc.y.abs() > 1.0 {
            return None;
        }
        Some(screen)
    }

    /// Like [`project_point`](Self::project_point) but keeps points outside the viewport; used when
    /// rasterising triangles that straddle the screen edge.
    pub fn project_unclipped(&self, point: Vec3, viewport: PhysicalSize<u32>) -> Option<(Vec2, Vec3)> {
        if viewport.width == 0 || viewport.height == 0 {
            return None;
        }
        let clip: Vec4 = self.view_projection(viewport) * point.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let x = (ndc.x + 1.0) * 0.5 * viewport.width as f32;
        let y = (1.0 - ndc.y) * 0.5 * viewport.height as f32;
        Some((Vec2::new(x, y), ndc))
    }
}

/// Orbit-style controller storing yaw/pitch around a target.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub radius: f32,
    pub yaw_radians: f32,
    pub pitch_radians: f32,
}

impl OrbitCamera {
    pub fn new(target: Vec3, radius: f32) -> Self {
        Self { target, radius: radius.max(0.01), yaw_radians: 0.0, pitch_radians: 0.0 }
    }

    pub fn with_angles(mut self, yaw_radians: f32, pitch_radians: f32) -> Self {
        self.yaw_radians = yaw_radians;
        self.pitch_radians = pitch_radians.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self
    }

    pub fn to_camera(&self, fov_y_radians: f32, near: f32, far: f32) -> Camera3D {
        let rotation = Quat::from_euler(glam::EulerRot::YXZ, self.yaw_radians, self.pitch_radians, 0.0);
        let offset = rotation * Vec3::new(0.0, 0.0, self.radius);
        let position = self.target + offset;
        Camera3D::new(position, self.target, fov_y_radians, near, far)
    }

    pub fn orbit(&mut self, delta: Vec2) {
        self.yaw_radians += delta.x;
        self.pitch_radians = (self.pitch_radians + delta.y).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn zoom(&mut self, factor: f32) {
        self.radius = (self.radius * factor).clamp(0.1, 10_000.0);
    }
}

/// Pointer-driven orbit/zoom input that can be switched off wholesale.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    orbit: OrbitCamera,
    enabled: bool,
    pub rotate_sensitivity: f32,
    pub zoom_sensitivity: f32,
    pub min_radius: f32,
    pub max_radius: f32,
}

impl OrbitControls {
    pub fn new(orbit: OrbitCamera) -> Self {
        Self {
            orbit,
            enabled: true,
            rotate_sensitivity: 0.008,
            zoom_sensitivity: 0.1,
            min_radius: 3.0,
            max_radius: 30.0,
        }
    }

    pub fn orbit(&self) -> &OrbitCamera {
        &self.orbit
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Applies a pointer drag in pixels. Returns whether the camera moved.
    pub fn drag(&mut self, delta_px: Vec2) -> bool {
        if !self.enabled || delta_px == Vec2::ZERO {
            return false;
        }
        self.orbit.orbit(Vec2::new(-delta_px.x, -delta_px.y) * self.rotate_sensitivity);
        true
    }

    /// Applies wheel steps (positive zooms in). Returns whether the camera moved.
    pub fn wheel(&mut self, steps: f32) -> bool {
        if !self.enabled || steps == 0.0 {
            return false;
        }
        self.orbit.zoom((1.0 - steps * self.zoom_sensitivity).max(0.1));
        self.orbit.radius = self.orbit.radius.clamp(self.min_radius, self.max_radius);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn front_camera() -> Camera3D {
        Camera3D::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 60.0_f32.to_radians(), 0.1, 1000.0)
    }

    #[test]
    fn camera3d_view_projection_is_finite() {
        let camera = Camera3D::new(Vec3::new(0.0, 1.0, 5.0), Vec3::ZERO, 60.0_f32.to_radians(), 0.1, 1000.0);
        let vp = camera.view_projection(PhysicalSize::new(1280, 720));
        assert!(!vp.to_cols_array().iter().any(|v| v.is_nan() || v.is_infinite()));
    }

    #[test]
    fn target_projects_to_viewport_center() {
        let screen = front_camera().project_point(Vec3::ZERO, PhysicalSize::new(800, 600)).expect("visible");
        assert!((screen - Vec2::new(400.0, 300.0)).length() < 1e-3);
    }

    #[test]
    fn points_behind_or_beside_the_camera_are_not_projected() {
        let camera = front_camera();
        let viewport = PhysicalSize::new(800, 600);
        assert!(camera.project_point(Vec3::new(0.0, 0.0, 10.0), viewport).is_none());
        assert!(camera.project_point(Vec3::new(50.0, 0.0, 0.0), viewport).is_none());
        assert!(camera.project_point(Vec3::ZERO, PhysicalSize::new(0, 600)).is_none());
    }

    #[test]
    fn orbit_camera_orbits_target() {
        let mut orbit = OrbitCamera::new(Vec3::ZERO, 5.0);
        orbit.orbit(Vec2::new(0.5, 0.25));
        let camera = orbit.to_camera(45.0f32.to_radians(), 0.1, 500.0);
        assert!((camera.position.distance(Vec3::ZERO) - 5.0).abs() < 1e-4);
    }

    #[test]
    fn disabled_controls_ignore_drag_and_wheel() {
        let mut controls = OrbitControls::new(OrbitCamera::new(Vec3::ZERO, 8.0));
        controls.set_enabled(false);
        assert!(!controls.drag(Vec2::new(40.0, 10.0)));
        assert!(!controls.wheel(2.0));
        assert_eq!(controls.orbit().yaw_radians, 0.0);
        assert_eq!(controls.orbit().radius, 8.0);

        controls.set_enabled(true);
        assert!(controls.drag(Vec2::new(40.0, 0.0)));
        assert!(controls.orbit().yaw_radians != 0.0);
    }
}
