//! Per-frame hotspot overlay snapshots.
//!
//! [`compute_overlays`] is a pure function of the catalog and the frame context; nothing here keeps
//! state between frames. Occluded anchors are hidden outright rather than faded.

use crate::anchors::AnchorCatalog;
use crate::camera3d::Camera3D;
use crate::occlusion::Occluder;
use glam::{Mat4, Vec2, Vec3};
use winit::dpi::PhysicalSize;

/// Marker radius at `hotspot_scale == 1.0`.
pub const HOTSPOT_RADIUS_PX: f32 = 14.0;

/// Rendering-side queries the overlay controller depends on.
pub trait SceneProbe {
    fn project_to_screen(&self, world: Vec3) -> Option<Vec2>;
    fn is_occluded(&self, world: Vec3) -> bool;
    fn eye(&self) -> Vec3;
}

/// Probe backed by a perspective camera and the owning model's world-space geometry.
pub struct CameraProbe<'a> {
    pub camera: &'a Camera3D,
    pub viewport: PhysicalSize<u32>,
    pub occluder: &'a Occluder,
}

impl SceneProbe for CameraProbe<'_> {
    fn project_to_screen(&self, world: Vec3) -> Option<Vec2> {
        self.camera.project_point(world, self.viewport)
    }

    fn is_occluded(&self, world: Vec3) -> bool {
        self.occluder.is_occluded(self.camera.position, world)
    }

    fn eye(&self) -> Vec3 {
        self.camera.position
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    pub model: Mat4,
    pub hotspots_visible: bool,
    pub hotspot_scale: f32,
    pub selected: Option<&'a str>,
    pub pointer: Option<Vec2>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayState {
    pub anchor_id: String,
    pub is_hovered: bool,
    /// Whether the marker should be drawn and can be clicked this frame.
    pub is_visible: bool,
    pub screen_position: Option<Vec2>,
    pub occluded: bool,
    /// Distance from the camera; smaller is in front.
    pub depth: f32,
}

pub fn hotspot_radius(scale: f32) -> f32 {
    HOTSPOT_RADIUS_PX * scale
}

pub fn compute_overlays(
    catalog: &AnchorCatalog,
    ctx: &FrameContext<'_>,
    probe: &dyn SceneProbe,
) -> Vec<OverlayState> {
    let gate_open = ctx.hotspots_visible && ctx.selected.is_none();
    let radius = hotspot_radius(ctx.hotspot_scale);
    let eye = probe.eye();
    catalog
        .iter()
        .map(|anchor| {
            let world = ctx.model.transform_point3(anchor.local_position);
            let screen_position = probe.project_to_screen(world);
            let occluded = screen_position.is_some() && probe.is_occluded(world);
            let is_visible = gate_open && screen_position.is_some() && !occluded;
            let is_hovered = is_visible
                && matches!((screen_position, ctx.pointer), (Some(at), Some(pointer)) if at.distance(pointer) <= radius);
            OverlayState {
                anchor_id: anchor.id.clone(),
                is_hovered,
                is_visible,
                screen_position,
                occluded,
                depth: eye.distance(world),
            }
        })
        .collect()
}

/// Frontmost visible overlay under `pointer`.
pub fn hit_test<'a>(overlays: &'a [OverlayState], pointer: Vec2, scale: f32) -> Option<&'a OverlayState> {
    let radius = hotspot_radius(scale);
    overlays
        .iter()
        .filter(|overlay| overlay.is_visible)
        .filter(|overlay| overlay.screen_position.is_some_and(|at| at.distance(pointer) <= radius))
        .min_by(|a, b| a.depth.total_cmp(&b.depth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchors::{Anchor, AnchorContent, DuplicatePolicy};

    /// Orthographic stand-in: x/y map straight to pixels, anchors with z < 0 are hidden.
    struct FlatProbe;

    impl SceneProbe for FlatProbe {
        fn project_to_screen(&self, world: Vec3) -> Option<Vec2> {
            (world.x >= 0.0 && world.y >= 0.0).then(|| Vec2::new(world.x, world.y))
        }

        fn is_occluded(&self, world: Vec3) -> bool {
            world.z < 0.0
        }

        fn eye(&self) -> Vec3 {
            Vec3::new(0.0, 0.0, 100.0)
        }
    }

    fn catalog() -> AnchorCatalog {
        let anchor = |id: &str, p: Vec3| Anchor::new(id, p, AnchorContent::Text(String::new()));
        AnchorCatalog::new(
            vec![
                anchor("front", Vec3::new(10.0, 10.0, 1.0)),
                anchor("back", Vec3::new(50.0, 50.0, -1.0)),
                anchor("offscreen", Vec3::new(-5.0, 10.0, 1.0)),
                anchor("near", Vec3::new(12.0, 10.0, 5.0)),
            ],
            DuplicatePolicy::Reject,
        )
        .expect("catalog")
    }

    fn ctx<'a>() -> FrameContext<'a> {
        FrameContext {
            model: Mat4::IDENTITY,
            hotspots_visible: true,
            hotspot_scale: 1.0,
            selected: None,
            pointer: None,
        }
    }

    #[test]
    fn occluded_and_offscreen_anchors_are_hidden() {
        let overlays = compute_overlays(&catalog(), &ctx(), &FlatProbe);
        let visible: Vec<_> = overlays.iter().filter(|o| o.is_visible).map(|o| o.anchor_id.as_str()).collect();
        assert_eq!(visible, ["front", "near"]);
        assert!(overlays[1].occluded);
        assert!(overlays[2].screen_position.is_none());
        assert!(!overlays[2].occluded);
    }

    #[test]
    fn global_flag_and_selection_hide_everything() {
        let hidden = FrameContext { hotspots_visible: false, ..ctx() };
        assert!(compute_overlays(&catalog(), &hidden, &FlatProbe).iter().all(|o| !o.is_visible));
        let selected = FrameContext { selected: Some("front"), ..ctx() };
        assert!(compute_overlays(&catalog(), &selected, &FlatProbe).iter().all(|o| !o.is_visible));
    }

    #[test]
    fn hover_and_hit_test_prefer_frontmost_marker() {
        let hovering = FrameContext { pointer: Some(Vec2::new(11.0, 10.0)), ..ctx() };
        let overlays = compute_overlays(&catalog(), &hovering, &FlatProbe);
        assert!(overlays[0].is_hovered && overlays[3].is_hovered);
        assert!(!overlays[1].is_hovered);
        let hit = hit_test(&overlays, Vec2::new(11.0, 10.0), 1.0).expect("hit");
        assert_eq!(hit.anchor_id, "near");
        assert!(hit_test(&overlays, Vec2::new(50.0, 50.0), 1.0).is_none(), "occluded markers are not clickable");
    }

    #[test]
    fn scale_widens_hover_radius() {
        let pointer = Vec2::new(10.0 + HOTSPOT_RADIUS_PX * 1.5, 10.0);
        let small = FrameContext { pointer: Some(pointer), ..ctx() };
        assert!(!compute_overlays(&catalog(), &small, &FlatProbe)[0].is_hovered);
        let large = FrameContext { pointer: Some(pointer), hotspot_scale: 2.0, ..ctx() };
        assert!(compute_overlays(&catalog(), &large, &FlatProbe)[0].is_hovered);
    }
}
