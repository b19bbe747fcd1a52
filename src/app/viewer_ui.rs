use crate::app::model_paint;
use crate::loading::LoadingIndicator;
use crate::overlay::hotspot_radius;
use crate::params::{AnimationParams, Settings};
use crate::selection::PointerTarget;
use crate::viewer::Viewer;
use anyhow::Result;
use egui::{Align2, Color32, FontId, Id, LayerId, Order, Pos2, Rect, Stroke};
use glam::Vec2;
use winit::dpi::PhysicalSize;

const MARKER_FILL: Color32 = Color32::from_rgb(236, 112, 48);
const MARKER_HOVER_FILL: Color32 = Color32::from_rgb(255, 170, 90);
const PANEL_MARGIN: f32 = 16.0;

/// Screen rectangles of the interactive UI, in physical pixels, as laid out on the last frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct UiLayout {
    pub trigger: Option<Rect>,
    pub panel: Option<Rect>,
    pub detail: Option<Rect>,
}

fn contains(rect: Option<Rect>, pointer: Vec2) -> bool {
    rect.is_some_and(|rect| rect.contains(Pos2::new(pointer.x, pointer.y)))
}

/// Innermost target under `pointer`: panel, trigger, detail box, backdrop, hotspot, then viewport.
pub(crate) fn resolve_pointer_target<F>(
    layout: &UiLayout,
    pointer: Vec2,
    selection_active: bool,
    panel_open: bool,
    hotspot_at: F,
) -> PointerTarget
where
    F: FnOnce(Vec2) -> Option<PointerTarget>,
{
    if panel_open && contains(layout.panel, pointer) {
        return PointerTarget::Panel;
    }
    if contains(layout.trigger, pointer) {
        return PointerTarget::PanelTrigger;
    }
    if selection_active {
        return if contains(layout.detail, pointer) {
            PointerTarget::DetailBox
        } else {
            PointerTarget::DetailBackdrop
        };
    }
    hotspot_at(pointer).unwrap_or(PointerTarget::Viewport)
}

/// Whether wheel input at `pointer` belongs to the UI rather than the camera.
pub(crate) fn pointer_over_ui(layout: &UiLayout, pointer: Vec2, panel_open: bool) -> bool {
    (panel_open && contains(layout.panel, pointer)) || contains(layout.trigger, pointer)
}

/// A single-parameter change from the settings panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ParamEdit {
    AutoRotate(bool),
    RotationSpeed(f32),
    SubPartSpin(bool),
    SubPartSpinSpeed(f32),
    AmbientIntensity(f32),
    DirectionalIntensity(f32),
    LightAngle(f32),
    HotspotsVisible(bool),
    HotspotScale(f32),
}

/// One edit made in the settings panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum SettingsEdit {
    Param(ParamEdit),
    ResetDefaults,
}

impl From<ParamEdit> for SettingsEdit {
    fn from(edit: ParamEdit) -> Self {
        SettingsEdit::Param(edit)
    }
}

/// Reset goes through the viewer so lighting and listeners see it.
pub(crate) fn apply_edit(viewer: &mut Viewer, edit: SettingsEdit) {
    let result = match edit {
        SettingsEdit::Param(param) => apply_param(viewer.settings_mut(), param),
        SettingsEdit::ResetDefaults => viewer.reset_settings(),
    };
    if let Err(err) = result {
        log::warn!("[ui] Rejected {edit:?}: {err:#}");
    }
}

fn apply_param(settings: &mut Settings, edit: ParamEdit) -> Result<()> {
    match edit {
        ParamEdit::AutoRotate(enabled) => settings.set_auto_rotate(enabled),
        ParamEdit::RotationSpeed(speed) => settings.set_rotation_speed(speed),
        ParamEdit::SubPartSpin(enabled) => settings.set_sub_part_spin(enabled),
        ParamEdit::SubPartSpinSpeed(speed) => settings.set_sub_part_spin_speed(speed),
        ParamEdit::AmbientIntensity(value) => settings.set_ambient_intensity(value),
        ParamEdit::DirectionalIntensity(value) => settings.set_directional_intensity(value),
        ParamEdit::LightAngle(degrees) => settings.set_light_angle(degrees),
        ParamEdit::HotspotsVisible(visible) => settings.set_hotspots_visible(visible),
        ParamEdit::HotspotScale(scale) => settings.set_hotspot_scale(scale),
    }
}

#[derive(Debug, Default)]
pub(crate) struct UiOutput {
    pub layout: UiLayout,
    pub edits: Vec<SettingsEdit>,
    pub toggle_panel: bool,
    pub close_detail: bool,
}

fn to_physical(rect: Rect, pixels_per_point: f32) -> Rect {
    Rect::from_min_max(
        (rect.min.to_vec2() * pixels_per_point).to_pos2(),
        (rect.max.to_vec2() * pixels_per_point).to_pos2(),
    )
}

pub(crate) fn draw(
    ctx: &egui::Context,
    viewer: &Viewer,
    loading: &LoadingIndicator,
    viewport: PhysicalSize<u32>,
    pixels_per_point: f32,
) -> UiOutput {
    let mut out = UiOutput::default();
    let ppp = pixels_per_point.max(f32::EPSILON);
    let screen =
        Rect::from_min_size(Pos2::ZERO, egui::vec2(viewport.width as f32 / ppp, viewport.height as f32 / ppp));
    let background = ctx.layer_painter(LayerId::background());

    if let Some(graph) = viewer.model() {
        let triangles = graph.world_triangles(viewer.model_matrix());
        let shaded = model_paint::shade_triangles(&triangles, viewer.camera(), viewer.light(), viewport);
        background.add(egui::Shape::mesh(model_paint::build_mesh(&shaded, ppp)));
    }
    if let Some(label) = loading.label() {
        background.text(screen.center(), Align2::CENTER_CENTER, label, FontId::proportional(22.0), Color32::WHITE);
    }

    draw_hotspots(&background, viewer, ppp);
    if let Some(anchor) = viewer.active_point() {
        let backdrop = ctx.layer_painter(LayerId::new(Order::Middle, Id::new("detail_backdrop")));
        backdrop.rect_filled(screen, 0.0, Color32::from_black_alpha(140));
        let shown = egui::Area::new(Id::new("detail_box"))
            .order(Order::Foreground)
            .anchor(Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_max_width(360.0);
                    ui.heading(anchor.id.as_str());
                    ui.separator();
                    for line in anchor.content.lines() {
                        ui.label(line);
                    }
                    ui.add_space(8.0);
                    if ui.button("Закрыть").clicked() {
                        out.close_detail = true;
                    }
                });
            });
        out.layout.detail = Some(to_physical(shown.response.rect, ppp));
    }

    let trigger = egui::Area::new(Id::new("settings_trigger"))
        .order(Order::Foreground)
        .anchor(Align2::RIGHT_TOP, egui::vec2(-PANEL_MARGIN, PANEL_MARGIN))
        .show(ctx, |ui| {
            if ui.button("⚙ Настройки").clicked() {
                out.toggle_panel = true;
            }
        });
    let trigger_rect = trigger.response.rect;
    out.layout.trigger = Some(to_physical(trigger_rect, ppp));

    if viewer.panel_open() {
        let panel = egui::Area::new(Id::new("settings_panel"))
            .order(Order::Foreground)
            .fixed_pos(Pos2::new(trigger_rect.right() - 300.0, trigger_rect.bottom() + 8.0))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_width(284.0);
                    settings_controls(ui, viewer.params(), &mut out.edits);
                });
            });
        out.layout.panel = Some(to_physical(panel.response.rect, ppp));
    }
    out
}

fn draw_hotspots(painter: &egui::Painter, viewer: &Viewer, ppp: f32) {
    let radius = hotspot_radius(viewer.params().hotspot_scale) / ppp;
    for overlay in viewer.displayable_overlays() {
        let Some(at) = overlay.screen_position else {
            continue;
        };
        let center = Pos2::new(at.x / ppp, at.y / ppp);
        let fill = if overlay.is_hovered { MARKER_HOVER_FILL } else { MARKER_FILL };
        painter.circle(center, radius, fill, Stroke::new(2.0, Color32::WHITE));
        painter.circle_filled(center, radius * 0.3, Color32::WHITE);
        if overlay.is_hovered {
            painter.text(
                center - egui::vec2(0.0, radius + 4.0),
                Align2::CENTER_BOTTOM,
                &overlay.anchor_id,
                FontId::proportional(15.0),
                Color32::WHITE,
            );
        }
    }
}

fn settings_controls(ui: &mut egui::Ui, params: &AnimationParams, edits: &mut Vec<SettingsEdit>) {
    let mut p = params.clone();
    ui.heading("Анимация");
    if ui.checkbox(&mut p.auto_rotate_enabled, "Автовращение").changed() {
        edits.push(ParamEdit::AutoRotate(p.auto_rotate_enabled).into());
    }
    if ui.add(egui::Slider::new(&mut p.rotation_speed, 0.05..=2.0).text("Скорость, рад/с")).changed() {
        edits.push(ParamEdit::RotationSpeed(p.rotation_speed).into());
    }
    if ui.checkbox(&mut p.sub_part_spin_enabled, "Вращение винта").changed() {
        edits.push(ParamEdit::SubPartSpin(p.sub_part_spin_enabled).into());
    }
    if ui.add(egui::Slider::new(&mut p.sub_part_spin_speed, 0.0..=40.0).text("Обороты, рад/с")).changed() {
        edits.push(ParamEdit::SubPartSpinSpeed(p.sub_part_spin_speed).into());
    }

    ui.separator();
    ui.heading("Освещение");
    if ui.add(egui::Slider::new(&mut p.ambient_light_intensity, 0.0..=2.0).text("Рассеянный")).changed() {
        edits.push(ParamEdit::AmbientIntensity(p.ambient_light_intensity).into());
    }
    if ui.add(egui::Slider::new(&mut p.directional_light_intensity, 0.0..=3.0).text("Направленный")).changed() {
        edits.push(ParamEdit::DirectionalIntensity(p.directional_light_intensity).into());
    }
    if ui.add(egui::Slider::new(&mut p.light_angle_degrees, 0.0..=359.0).text("Угол, °")).changed() {
        edits.push(ParamEdit::LightAngle(p.light_angle_degrees).into());
    }

    ui.separator();
    ui.heading("Точки");
    if ui.checkbox(&mut p.hotspots_visible, "Показывать точки").changed() {
        edits.push(ParamEdit::HotspotsVisible(p.hotspots_visible).into());
    }
    if ui.add(egui::Slider::new(&mut p.hotspot_scale, 0.5..=2.5).text("Размер")).changed() {
        edits.push(ParamEdit::HotspotScale(p.hotspot_scale).into());
    }

    ui.separator();
    if ui.button("Сбросить настройки").clicked() {
        edits.push(SettingsEdit::ResetDefaults);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchors::AnchorCatalog;
    use crate::animation::SpinnerSpec;
    use crate::config::CameraConfig;
    use crate::prefs::PreferenceStore;

    fn layout() -> UiLayout {
        UiLayout {
            trigger: Some(Rect::from_min_max(Pos2::new(900.0, 10.0), Pos2::new(1000.0, 40.0))),
            panel: Some(Rect::from_min_max(Pos2::new(700.0, 50.0), Pos2::new(1000.0, 400.0))),
            detail: Some(Rect::from_min_max(Pos2::new(300.0, 200.0), Pos2::new(600.0, 400.0))),
        }
    }

    fn hotspot(_: Vec2) -> Option<PointerTarget> {
        Some(PointerTarget::Hotspot("a".into()))
    }

    #[test]
    fn panel_and_trigger_win_over_everything_below() {
        let l = layout();
        let on_panel = resolve_pointer_target(&l, Vec2::new(800.0, 100.0), true, true, hotspot);
        assert_eq!(on_panel, PointerTarget::Panel);
        assert_eq!(
            resolve_pointer_target(&l, Vec2::new(800.0, 100.0), false, false, hotspot),
            PointerTarget::Hotspot("a".into()),
            "a closed panel's stale rect is ignored"
        );
        assert_eq!(
            resolve_pointer_target(&l, Vec2::new(950.0, 20.0), false, false, hotspot),
            PointerTarget::PanelTrigger
        );
    }

    #[test]
    fn open_detail_covers_the_viewport_with_its_backdrop() {
        let l = layout();
        let inside = resolve_pointer_target(&l, Vec2::new(400.0, 300.0), true, false, hotspot);
        assert_eq!(inside, PointerTarget::DetailBox);
        assert_eq!(
            resolve_pointer_target(&l, Vec2::new(50.0, 600.0), true, false, hotspot),
            PointerTarget::DetailBackdrop
        );
        let empty = resolve_pointer_target(&l, Vec2::new(50.0, 600.0), false, false, |_| None);
        assert_eq!(empty, PointerTarget::Viewport);
    }

    #[test]
    fn rejected_edits_leave_params_alone() {
        let mut viewer = Viewer::new(
            AnchorCatalog::aircraft_default(),
            Settings::load(PreferenceStore::in_memory()),
            SpinnerSpec::aircraft_default(),
            &CameraConfig::default(),
        );
        apply_edit(&mut viewer, ParamEdit::RotationSpeed(-1.0).into());
        assert_eq!(viewer.params().rotation_speed, AnimationParams::default().rotation_speed);
        apply_edit(&mut viewer, ParamEdit::HotspotScale(2.0).into());
        apply_edit(&mut viewer, ParamEdit::LightAngle(400.0).into());
        assert_eq!(viewer.params().hotspot_scale, 2.0);
        assert!((viewer.params().light_angle_degrees - 40.0).abs() < 1e-4);
        apply_edit(&mut viewer, SettingsEdit::ResetDefaults);
        assert_eq!(viewer.params(), &AnimationParams::default());
    }

    #[test]
    fn panel_reset_refreshes_light_and_notifies() {
        let mut viewer = Viewer::new(
            AnchorCatalog::aircraft_default(),
            Settings::load(PreferenceStore::in_memory()),
            SpinnerSpec::aircraft_default(),
            &CameraConfig::default(),
        );
        apply_edit(&mut viewer, ParamEdit::LightAngle(180.0).into());
        apply_edit(&mut viewer, ParamEdit::AmbientIntensity(1.5).into());
        viewer.frame(0.0, PhysicalSize::new(800, 600), None);
        assert_eq!(viewer.light().ambient, 1.5);
        viewer.drain_events();

        apply_edit(&mut viewer, SettingsEdit::ResetDefaults);
        let defaults = AnimationParams::default();
        let expected = crate::animation::light_position(defaults.light_angle_degrees);
        assert!((viewer.light().position() - expected).length() < 1e-4);
        assert_eq!(viewer.light().ambient, defaults.ambient_light_intensity);
        assert_eq!(viewer.drain_events(), vec![crate::events::ViewerEvent::SettingsReset]);
    }

    #[test]
    fn wheel_over_panel_is_not_camera_input() {
        let l = layout();
        assert!(pointer_over_ui(&l, Vec2::new(800.0, 100.0), true));
        assert!(!pointer_over_ui(&l, Vec2::new(800.0, 100.0), false));
        assert!(!pointer_over_ui(&l, Vec2::new(10.0, 500.0), true));
    }
}
