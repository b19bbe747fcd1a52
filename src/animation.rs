use crate::model::{ModelGraph, NodeId};
use crate::params::AnimationParams;
use crate::wrap_angle;
use glam::{Mat4, Quat, Vec3};
use serde::Deserialize;

pub const LIGHT_RADIUS: f32 = 10.0;
pub const LIGHT_HEIGHT: f32 = 10.0;

/// A model part that spins about its own local axis.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpinnerSpec {
    pub name: String,
    #[serde(default = "SpinnerSpec::default_axis")]
    pub axis: Vec3,
}

impl SpinnerSpec {
    pub fn new(name: impl Into<String>, axis: Vec3) -> Self {
        Self { name: name.into(), axis }
    }

    fn default_axis() -> Vec3 {
        Vec3::X
    }

    pub fn aircraft_default() -> Vec<SpinnerSpec> {
        vec![SpinnerSpec::new("Propeller", Vec3::X)]
    }
}

/// Spinner names resolved against one loaded model. Absent parts stay `None` and are skipped.
#[derive(Debug, Clone, Default)]
pub struct SpinTable {
    entries: Vec<(SpinnerSpec, Option<NodeId>)>,
}

impl SpinTable {
    pub fn resolve(specs: &[SpinnerSpec], graph: &ModelGraph) -> Self {
        let entries = specs
            .iter()
            .map(|spec| {
                let node = graph.find_node(&spec.name);
                if node.is_none() {
                    log::debug!("[animation] Spinner '{}' not present in {}; skipping.", spec.name, graph.label());
                }
                (spec.clone(), node)
            })
            .collect();
        Self { entries }
    }

    pub fn resolved_count(&self) -> usize {
        self.entries.iter().filter(|(_, node)| node.is_some()).count()
    }
}

/// Per-frame mutation of the model yaw and spinning parts.
#[derive(Debug, Clone)]
pub struct AnimationCoordinator {
    specs: Vec<SpinnerSpec>,
    table: Option<SpinTable>,
    yaw: f32,
}

impl AnimationCoordinator {
    pub fn new(specs: Vec<SpinnerSpec>) -> Self {
        Self { specs, table: None, yaw: 0.0 }
    }

    /// Resolves spinner names once, right after the model is loaded.
    pub fn bind(&mut self, graph: &ModelGraph) {
        let table = SpinTable::resolve(&self.specs, graph);
        log::info!("[animation] {} of {} spinning parts found", table.resolved_count(), self.specs.len());
        self.table = Some(table);
    }

    #[cfg(test)]
    pub fn spin_table(&self) -> Option<&SpinTable> {
        self.table.as_ref()
    }

    #[cfg(test)]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_y(self.yaw)
    }

    /// Advances one frame. Nothing moves until a model is present and bound.
    pub fn advance(
        &mut self,
        dt: f32,
        params: &AnimationParams,
        selection_active: bool,
        model: Option<&mut ModelGraph>,
    ) {
        let (Some(graph), Some(table)) = (model, self.table.as_ref()) else {
            return;
        };
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        if params.auto_rotate_enabled && !selection_active {
            self.yaw = wrap_angle(self.yaw + dt * params.rotation_speed);
        }
        if params.sub_part_spin_enabled && params.sub_part_spin_speed > 0.0 {
            let step = dt * params.sub_part_spin_speed;
            for (spec, node) in &table.entries {
                let Some(node) = node.and_then(|id| graph.node_mut(id)) else {
                    continue;
                };
                let axis = spec.axis.try_normalize().unwrap_or(Vec3::X);
                node.rotation = (node.rotation * Quat::from_axis_angle(axis, step)).normalize();
            }
        }
    }
}

pub fn light_position(angle_degrees: f32) -> Vec3 {
    let theta = angle_degrees.to_radians();
    Vec3::new(LIGHT_RADIUS * theta.cos(), LIGHT_HEIGHT, LIGHT_RADIUS * theta.sin())
}

/// Ambient + one directional light whose position follows the angle parameter.
#[derive(Debug, Clone)]
pub struct LightRig {
    angle_degrees: f32,
    position: Vec3,
    pub ambient: f32,
    pub directional: f32,
}

impl LightRig {
    pub fn from_params(params: &AnimationParams) -> Self {
        Self {
            angle_degrees: params.light_angle_degrees,
            position: light_position(params.light_angle_degrees),
            ambient: params.ambient_light_intensity,
            directional: params.directional_light_intensity,
        }
    }

    /// Picks up parameter edits; the position is recomputed only when the angle changed.
    pub fn sync(&mut self, params: &AnimationParams) -> bool {
        self.ambient = params.ambient_light_intensity;
        self.directional = params.directional_light_intensity;
        if params.light_angle_degrees == self.angle_degrees {
            return false;
        }
        self.angle_degrees = params.light_angle_degrees;
        self.position = light_position(self.angle_degrees);
        true
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Unit vector from the model origin toward the light.
    pub fn direction(&self) -> Vec3 {
        self.position.normalize_or_zero()
    }

    /// Lambert term with an ambient floor, for a surface with unit `normal`.
    pub fn intensity(&self, normal: Vec3) -> f32 {
        self.ambient + self.directional * normal.dot(self.direction()).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-4, "expected {b:?}, got {a:?}");
    }

    #[test]
    fn light_position_follows_angle() {
        approx(light_position(0.0), Vec3::new(10.0, 10.0, 0.0));
        approx(light_position(90.0), Vec3::new(0.0, 10.0, 10.0));
        approx(light_position(180.0), Vec3::new(-10.0, 10.0, 0.0));
    }

    #[test]
    fn light_rig_recomputes_only_on_angle_change() {
        let mut params = AnimationParams::default();
        let mut rig = LightRig::from_params(&params);
        params.ambient_light_intensity = 0.1;
        assert!(!rig.sync(&params));
        assert_eq!(rig.ambient, 0.1);
        params.light_angle_degrees = 180.0;
        assert!(rig.sync(&params));
        approx(rig.position(), Vec3::new(-10.0, 10.0, 0.0));
    }

    #[test]
    fn yaw_is_frozen_when_rotation_is_disabled() {
        let mut graph = ModelGraph::procedural_aircraft();
        let mut coordinator = AnimationCoordinator::new(SpinnerSpec::aircraft_default());
        coordinator.bind(&graph);
        let params = AnimationParams { auto_rotate_enabled: false, ..AnimationParams::default() };
        for dt in [0.016, 0.5, 3.0, 0.001] {
            coordinator.advance(dt, &params, false, Some(&mut graph));
        }
        assert_eq!(coordinator.yaw(), 0.0);
    }

    #[test]
    fn selection_freezes_yaw_but_not_spin() {
        let mut graph = ModelGraph::procedural_aircraft();
        let mut coordinator = AnimationCoordinator::new(SpinnerSpec::aircraft_default());
        coordinator.bind(&graph);
        let params = AnimationParams::default();
        coordinator.advance(0.5, &params, false, Some(&mut graph));
        let yaw = coordinator.yaw();
        assert!((yaw - 0.15).abs() < 1e-5);
        coordinator.advance(0.5, &params, true, Some(&mut graph));
        assert_eq!(coordinator.yaw(), yaw);
        let propeller = graph.find_node("Propeller").and_then(|id| graph.node(id)).expect("propeller");
        assert!(propeller.rotation.angle_between(Quat::IDENTITY) > 0.1);
    }

    #[test]
    fn missing_parts_and_unloaded_models_are_no_ops() {
        let mut graph = ModelGraph::procedural_aircraft();
        let mut coordinator =
            AnimationCoordinator::new(vec![SpinnerSpec::new("Rotor", Vec3::Y), SpinnerSpec::new("Propeller", Vec3::X)]);
        coordinator.advance(1.0, &AnimationParams::default(), false, None);
        assert_eq!(coordinator.yaw(), 0.0);
        coordinator.bind(&graph);
        assert_eq!(coordinator.spin_table().map(SpinTable::resolved_count), Some(1));
        coordinator.advance(0.1, &AnimationParams::default(), false, Some(&mut graph));
        assert!(coordinator.yaw() > 0.0);
    }
}
