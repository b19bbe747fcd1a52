//! The viewer core: everything the application shell drives each frame, with no window attached.
//!
//! Frame order is fixed. Animation mutates the model first, then overlays are projected from that
//! same frame's model transform, so markers never lag the geometry by a frame.

use crate::animation::{AnimationCoordinator, LightRig, SpinnerSpec};
use crate::anchors::{Anchor, AnchorCatalog};
use crate::camera3d::{Camera3D, OrbitCamera, OrbitControls};
use crate::config::CameraConfig;
use crate::events::{EventBus, ViewerEvent};
use crate::model::ModelGraph;
use crate::occlusion::Occluder;
use crate::overlay::{compute_overlays, hit_test, CameraProbe, FrameContext, OverlayState};
use crate::params::{AnimationParams, Settings};
use crate::selection::{InteractionState, PointerOutcome, PointerTarget};
use anyhow::Result;
use glam::{Mat4, Vec2, Vec3};
use winit::dpi::PhysicalSize;

#[derive(Debug, Clone, Copy)]
struct Lens {
    fov_y_radians: f32,
    near: f32,
    far: f32,
}

pub struct Viewer {
    catalog: AnchorCatalog,
    settings: Settings,
    model: Option<ModelGraph>,
    animation: AnimationCoordinator,
    light: LightRig,
    controls: OrbitControls,
    lens: Lens,
    camera: Camera3D,
    occluder: Occluder,
    interaction: InteractionState,
    events: EventBus,
    overlays: Vec<OverlayState>,
}

impl Viewer {
    pub fn new(
        catalog: AnchorCatalog,
        settings: Settings,
        spinners: Vec<SpinnerSpec>,
        camera: &CameraConfig,
    ) -> Self {
        let orbit = OrbitCamera::new(Vec3::ZERO, camera.radius)
            .with_angles(camera.yaw_degrees.to_radians(), camera.pitch_degrees.to_radians());
        let lens = Lens { fov_y_radians: camera.fov_degrees.to_radians(), near: camera.near, far: camera.far };
        let light = LightRig::from_params(settings.params());
        Self {
            catalog,
            settings,
            model: None,
            animation: AnimationCoordinator::new(spinners),
            light,
            camera: orbit.to_camera(lens.fov_y_radians, lens.near, lens.far),
            controls: OrbitControls::new(orbit),
            lens,
            occluder: Occluder::default(),
            interaction: InteractionState::new(),
            events: EventBus::default(),
            overlays: Vec::new(),
        }
    }

    /// Installs the loaded model and resolves its spinning parts.
    pub fn set_model(&mut self, graph: ModelGraph) {
        log::info!(
            "[viewer] Model '{}' ready: {} nodes, {} triangles",
            graph.label(),
            graph.node_count(),
            graph.triangle_count()
        );
        self.animation.bind(&graph);
        self.model = Some(graph);
    }

    pub fn is_model_ready(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Option<&ModelGraph> {
        self.model.as_ref()
    }

    /// Current model transform (the auto-rotation yaw).
    pub fn model_matrix(&self) -> Mat4 {
        self.animation.model_matrix()
    }

    pub fn frame(&mut self, dt: f32, viewport: PhysicalSize<u32>, pointer: Option<Vec2>) {
        self.controls.set_enabled(self.interaction.camera_input_enabled());
        let selection_active = self.interaction.selection().is_active();
        self.animation.advance(dt, self.settings.params(), selection_active, self.model.as_mut());
        self.light.sync(self.settings.params());

        self.camera = self.controls.orbit().to_camera(self.lens.fov_y_radians, self.lens.near, self.lens.far);
        let model_matrix = self.animation.model_matrix();
        self.occluder = match &self.model {
            Some(graph) => Occluder::from_model(graph, model_matrix),
            None => Occluder::default(),
        };

        let params = self.settings.params();
        let ctx = FrameContext {
            model: model_matrix,
            hotspots_visible: params.hotspots_visible,
            hotspot_scale: params.hotspot_scale,
            selected: self.interaction.selection().active_point().map(|anchor| anchor.id.as_str()),
            pointer,
        };
        let probe = CameraProbe { camera: &self.camera, viewport, occluder: &self.occluder };
        self.overlays = compute_overlays(&self.catalog, &ctx, &probe);
    }

    /// Overlay snapshot of the last [`frame`](Self::frame).
    pub fn overlays(&self) -> &[OverlayState] {
        &self.overlays
    }

    pub fn displayable_overlays(&self) -> impl Iterator<Item = &OverlayState> {
        self.overlays.iter().filter(|overlay| overlay.is_visible)
    }

    /// The hotspot under `pointer` in the last snapshot, if any.
    pub fn hotspot_at(&self, pointer: Vec2) -> Option<PointerTarget> {
        hit_test(&self.overlays, pointer, self.settings.params().hotspot_scale)
            .map(|overlay| PointerTarget::Hotspot(overlay.anchor_id.clone()))
    }

    pub fn pointer_down(&mut self, target: &PointerTarget) -> PointerOutcome {
        let catalog = &self.catalog;
        let outcome = self.interaction.pointer_down(target, |id| catalog.get(id));
        if outcome.panel_closed {
            self.events.push(ViewerEvent::PanelToggled { open: false });
        }
        if let Some(anchor) = &outcome.activated {
            log::info!("[viewer] Point '{}' activated", anchor.id);
            self.events.push(ViewerEvent::PointActivated(anchor.clone()));
        }
        if outcome.selection_cleared {
            self.events.push(ViewerEvent::SelectionCleared);
        }
        self.controls.set_enabled(self.interaction.camera_input_enabled());
        outcome
    }

    /// Dismisses the detail view (close button or keyboard). Returns whether anything was selected.
    pub fn close_detail(&mut self) -> bool {
        let cleared = self.interaction.clear_selection();
        if cleared {
            self.events.push(ViewerEvent::SelectionCleared);
        }
        self.controls.set_enabled(self.interaction.camera_input_enabled());
        cleared
    }

    pub fn toggle_panel(&mut self) -> bool {
        let open = self.interaction.toggle_panel();
        self.events.push(ViewerEvent::PanelToggled { open });
        open
    }

    pub fn active_point(&self) -> Option<&Anchor> {
        self.interaction.selection().active_point()
    }

    pub fn panel_open(&self) -> bool {
        self.interaction.panel().is_open()
    }

    pub fn camera_input_enabled(&self) -> bool {
        self.interaction.camera_input_enabled()
    }

    /// Returns whether the camera moved; ignored while a point is selected.
    pub fn orbit_drag(&mut self, delta_px: Vec2) -> bool {
        self.controls.set_enabled(self.interaction.camera_input_enabled());
        self.controls.drag(delta_px)
    }

    pub fn zoom(&mut self, steps: f32) -> bool {
        self.controls.set_enabled(self.interaction.camera_input_enabled());
        self.controls.wheel(steps)
    }

    pub fn camera(&self) -> &Camera3D {
        &self.camera
    }

    pub fn light(&self) -> &LightRig {
        &self.light
    }

    pub fn catalog(&self) -> &AnchorCatalog {
        &self.catalog
    }

    pub fn params(&self) -> &AnimationParams {
        self.settings.params()
    }

    /// Validated parameter edits. Lighting picks them up on the next frame.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn reset_settings(&mut self) -> Result<()> {
        self.settings.reset_to_defaults()?;
        self.light.sync(self.settings.params());
        self.events.push(ViewerEvent::SettingsReset);
        Ok(())
    }

    pub fn drain_events(&mut self) -> Vec<ViewerEvent> {
        self.events.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::PreferenceStore;

    const VIEWPORT: PhysicalSize<u32> = PhysicalSize::new(1280, 720);

    fn viewer() -> Viewer {
        let settings = Settings::load(PreferenceStore::in_memory());
        let mut viewer = Viewer::new(
            AnchorCatalog::aircraft_default(),
            settings,
            SpinnerSpec::aircraft_default(),
            &CameraConfig::default(),
        );
        viewer.set_model(ModelGraph::procedural_aircraft());
        viewer
    }

    #[test]
    fn nothing_is_displayed_before_the_model_is_ready() {
        let mut viewer = Viewer::new(
            AnchorCatalog::aircraft_default(),
            Settings::load(PreferenceStore::in_memory()),
            SpinnerSpec::aircraft_default(),
            &CameraConfig::default(),
        );
        viewer.frame(1.0, VIEWPORT, None);
        assert_eq!(viewer.animation.yaw(), 0.0, "no rotation without a model");
        assert!(!viewer.is_model_ready());
    }

    #[test]
    fn overlays_use_the_same_frame_model_transform() {
        let mut viewer = viewer();
        viewer.frame(0.5, VIEWPORT, None);
        let cockpit = viewer.catalog().get("Кабина пилота").expect("cockpit").local_position;
        let world = viewer.model_matrix().transform_point3(cockpit);
        let expected = viewer.camera().project_point(world, VIEWPORT);
        let overlay = viewer.overlays().iter().find(|o| o.anchor_id == "Кабина пилота").expect("overlay");
        assert_eq!(overlay.screen_position, expected);
    }

    #[test]
    fn selection_blocks_orbit_and_zoom() {
        let mut viewer = viewer();
        viewer.pointer_down(&PointerTarget::Hotspot("Двигатель".into()));
        assert!(!viewer.orbit_drag(Vec2::new(30.0, 0.0)));
        assert!(!viewer.zoom(1.0));
        assert!(viewer.close_detail());
        assert!(viewer.orbit_drag(Vec2::new(30.0, 0.0)));
    }

    #[test]
    fn events_follow_interactions() {
        let mut viewer = viewer();
        viewer.toggle_panel();
        viewer.pointer_down(&PointerTarget::Hotspot("Двигатель".into()));
        viewer.pointer_down(&PointerTarget::DetailBackdrop);
        let events = viewer.drain_events();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0], ViewerEvent::PanelToggled { open: true });
        assert!(matches!(&events[1], ViewerEvent::PointActivated(anchor) if anchor.id == "Двигатель"));
        assert_eq!(events[2], ViewerEvent::PanelToggled { open: false });
        assert_eq!(events[3], ViewerEvent::SelectionCleared);
    }
}
