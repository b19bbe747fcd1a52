use crate::prefs::PreferenceStore;
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

pub const KEY_AUTO_ROTATE: &str = "viewer.auto_rotate";
pub const KEY_ROTATION_SPEED: &str = "viewer.rotation_speed";
pub const KEY_SUB_PART_SPIN: &str = "viewer.sub_part_spin";
pub const KEY_SUB_PART_SPIN_SPEED: &str = "viewer.sub_part_spin_speed";
pub const KEY_AMBIENT_INTENSITY: &str = "viewer.ambient_intensity";
pub const KEY_DIRECTIONAL_INTENSITY: &str = "viewer.directional_intensity";
pub const KEY_LIGHT_ANGLE: &str = "viewer.light_angle_degrees";
pub const KEY_HOTSPOTS_VISIBLE: &str = "viewer.hotspots_visible";
pub const KEY_HOTSPOT_SCALE: &str = "viewer.hotspot_scale";

pub const ALL_KEYS: [&str; 9] = [
    KEY_AUTO_ROTATE,
    KEY_ROTATION_SPEED,
    KEY_SUB_PART_SPIN,
    KEY_SUB_PART_SPIN_SPEED,
    KEY_AMBIENT_INTENSITY,
    KEY_DIRECTIONAL_INTENSITY,
    KEY_LIGHT_ANGLE,
    KEY_HOTSPOTS_VISIBLE,
    KEY_HOTSPOT_SCALE,
];

/// User-adjustable animation, lighting and hotspot parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationParams {
    pub auto_rotate_enabled: bool,
    /// Radians per second.
    pub rotation_speed: f32,
    pub sub_part_spin_enabled: bool,
    /// Radians per second.
    pub sub_part_spin_speed: f32,
    pub ambient_light_intensity: f32,
    pub directional_light_intensity: f32,
    /// Always in `[0, 360)`.
    pub light_angle_degrees: f32,
    pub hotspots_visible: bool,
    pub hotspot_scale: f32,
}

impl Default for AnimationParams {
    fn default() -> Self {
        Self {
            auto_rotate_enabled: true,
            rotation_speed: 0.3,
            sub_part_spin_enabled: true,
            sub_part_spin_speed: 12.0,
            ambient_light_intensity: 0.45,
            directional_light_intensity: 0.9,
            light_angle_degrees: 45.0,
            hotspots_visible: true,
            hotspot_scale: 1.0,
        }
    }
}

fn positive(v: &f32) -> bool {
    v.is_finite() && *v > 0.0
}

fn non_negative(v: &f32) -> bool {
    v.is_finite() && *v >= 0.0
}

fn angle_in_range(v: &f32) -> bool {
    v.is_finite() && (0.0..360.0).contains(v)
}

impl AnimationParams {
    /// Reads every field from `store`, substituting the default for anything missing or out of range.
    pub fn load(store: &PreferenceStore) -> Self {
        let d = Self::default();
        Self {
            auto_rotate_enabled: store.get(KEY_AUTO_ROTATE, d.auto_rotate_enabled),
            rotation_speed: store.get_validated(KEY_ROTATION_SPEED, d.rotation_speed, positive),
            sub_part_spin_enabled: store.get(KEY_SUB_PART_SPIN, d.sub_part_spin_enabled),
            sub_part_spin_speed: store.get_validated(
                KEY_SUB_PART_SPIN_SPEED,
                d.sub_part_spin_speed,
                non_negative,
            ),
            ambient_light_intensity: store.get_validated(
                KEY_AMBIENT_INTENSITY,
                d.ambient_light_intensity,
                non_negative,
            ),
            directional_light_intensity: store.get_validated(
                KEY_DIRECTIONAL_INTENSITY,
                d.directional_light_intensity,
                non_negative,
            ),
            light_angle_degrees: store.get_validated(KEY_LIGHT_ANGLE, d.light_angle_degrees, angle_in_range),
            hotspots_visible: store.get(KEY_HOTSPOTS_VISIBLE, d.hotspots_visible),
            hotspot_scale: store.get_validated(KEY_HOTSPOT_SCALE, d.hotspot_scale, positive),
        }
    }

    pub fn is_within_domain(&self) -> bool {
        positive(&self.rotation_speed)
            && non_negative(&self.sub_part_spin_speed)
            && non_negative(&self.ambient_light_intensity)
            && non_negative(&self.directional_light_intensity)
            && angle_in_range(&self.light_angle_degrees)
            && positive(&self.hotspot_scale)
    }
}

/// Wraps any finite angle into `[0, 360)`.
pub fn normalize_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// The single load/save boundary for [`AnimationParams`]. Every setter persists before it updates
/// memory, so a failed write leaves both sides unchanged.
pub struct Settings {
    params: AnimationParams,
    store: PreferenceStore,
}

impl Settings {
    pub fn load(store: PreferenceStore) -> Self {
        let params = AnimationParams::load(&store);
        log::debug!("[settings] Loaded {params:?}");
        Self { params, store }
    }

    pub fn params(&self) -> &AnimationParams {
        &self.params
    }

    pub fn store(&self) -> &PreferenceStore {
        &self.store
    }

    pub fn set_auto_rotate(&mut self, enabled: bool) -> Result<()> {
        self.store.set(KEY_AUTO_ROTATE, &enabled)?;
        self.params.auto_rotate_enabled = enabled;
        Ok(())
    }

    pub fn set_rotation_speed(&mut self, speed: f32) -> Result<()> {
        ensure!(positive(&speed), "Rotation speed must be a positive number, got {speed}");
        self.store.set(KEY_ROTATION_SPEED, &speed)?;
        self.params.rotation_speed = speed;
        Ok(())
    }

    pub fn set_sub_part_spin(&mut self, enabled: bool) -> Result<()> {
        self.store.set(KEY_SUB_PART_SPIN, &enabled)?;
        self.params.sub_part_spin_enabled = enabled;
        Ok(())
    }

    pub fn set_sub_part_spin_speed(&mut self, speed: f32) -> Result<()> {
        ensure!(non_negative(&speed), "Spin speed must be zero or positive, got {speed}");
        self.store.set(KEY_SUB_PART_SPIN_SPEED, &speed)?;
        self.params.sub_part_spin_speed = speed;
        Ok(())
    }

    pub fn set_ambient_intensity(&mut self, intensity: f32) -> Result<()> {
        ensure!(non_negative(&intensity), "Ambient intensity must be zero or positive, got {intensity}");
        self.store.set(KEY_AMBIENT_INTENSITY, &intensity)?;
        self.params.ambient_light_intensity = intensity;
        Ok(())
    }

    pub fn set_directional_intensity(&mut self, intensity: f32) -> Result<()> {
        ensure!(
            non_negative(&intensity),
            "Directional intensity must be zero or positive, got {intensity}"
        );
        self.store.set(KEY_DIRECTIONAL_INTENSITY, &intensity)?;
        self.params.directional_light_intensity = intensity;
        Ok(())
    }

    /// Any finite angle is accepted and wrapped into `[0, 360)`.
    pub fn set_light_angle(&mut self, degrees: f32) -> Result<()> {
        ensure!(degrees.is_finite(), "Light angle must be finite, got {degrees}");
        let degrees = normalize_degrees(degrees);
        self.store.set(KEY_LIGHT_ANGLE, &degrees)?;
        self.params.light_angle_degrees = degrees;
        Ok(())
    }

    pub fn set_hotspots_visible(&mut self, visible: bool) -> Result<()> {
        self.store.set(KEY_HOTSPOTS_VISIBLE, &visible)?;
        self.params.hotspots_visible = visible;
        Ok(())
    }

    pub fn set_hotspot_scale(&mut self, scale: f32) -> Result<()> {
        ensure!(positive(&scale), "Hotspot scale must be positive, got {scale}");
        self.store.set(KEY_HOTSPOT_SCALE, &scale)?;
        self.params.hotspot_scale = scale;
        Ok(())
    }

    /// Purges every persisted parameter, then restores defaults in memory. When the purge fails the
    /// in-memory parameters are left untouched.
    pub fn reset_to_defaults(&mut self) -> Result<()> {
        self.store.remove_all(&ALL_KEYS)?;
        self.params = AnimationParams::default();
        log::info!("[settings] Parameters reset to defaults");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::{MemoryBackend, PreferenceBackend};
    use anyhow::bail;
    use serde_json::{json, Value};

    struct ReadOnlyBackend;

    impl PreferenceBackend for ReadOnlyBackend {
        fn load_entry(&self, _key: &str) -> Option<Value> {
            None
        }

        fn store_entry(&mut self, key: &str, _value: Value) -> Result<()> {
            bail!("read-only storage rejected '{key}'")
        }

        fn remove_entries(&mut self, _keys: &[&str]) -> Result<()> {
            bail!("read-only storage")
        }
    }

    #[test]
    fn defaults_are_within_domain() {
        assert!(AnimationParams::default().is_within_domain());
    }

    #[test]
    fn out_of_domain_entries_are_replaced_field_by_field() {
        let store = PreferenceStore::new(MemoryBackend::with_entries([
            (KEY_ROTATION_SPEED, json!(0.0)),
            (KEY_LIGHT_ANGLE, json!(360.0)),
            (KEY_HOTSPOT_SCALE, json!("big")),
            (KEY_SUB_PART_SPIN_SPEED, json!(3.5)),
            (KEY_AUTO_ROTATE, json!(false)),
        ]));
        let params = AnimationParams::load(&store);
        let defaults = AnimationParams::default();
        assert_eq!(params.rotation_speed, defaults.rotation_speed);
        assert_eq!(params.light_angle_degrees, defaults.light_angle_degrees);
        assert_eq!(params.hotspot_scale, defaults.hotspot_scale);
        assert_eq!(params.sub_part_spin_speed, 3.5);
        assert!(!params.auto_rotate_enabled);
        assert!(params.is_within_domain());
    }

    #[test]
    fn setters_reject_invalid_values_without_persisting() {
        let mut settings = Settings::load(PreferenceStore::in_memory());
        assert!(settings.set_rotation_speed(-1.0).is_err());
        assert!(settings.set_hotspot_scale(f32::NAN).is_err());
        assert!(!settings.store().contains(KEY_ROTATION_SPEED));
        assert_eq!(settings.params(), &AnimationParams::default());
    }

    #[test]
    fn light_angle_wraps_into_range() {
        let mut settings = Settings::load(PreferenceStore::in_memory());
        settings.set_light_angle(370.0).expect("finite angle");
        assert!((settings.params().light_angle_degrees - 10.0).abs() < 1e-4);
        settings.set_light_angle(-90.0).expect("finite angle");
        assert!((settings.params().light_angle_degrees - 270.0).abs() < 1e-4);
        assert_eq!(normalize_degrees(-0.0), 0.0);
    }

    #[test]
    fn failed_writes_are_reported_and_memory_stays_put() {
        let mut settings = Settings::load(PreferenceStore::new(ReadOnlyBackend));
        let err = settings.set_auto_rotate(false).expect_err("write must fail");
        assert!(format!("{err:#}").contains("viewer.auto_rotate"));
        assert!(settings.set_hotspots_visible(false).is_err());
        assert!(settings.set_light_angle(120.0).is_err());
        assert!(settings.set_hotspot_scale(2.0).is_err());
        assert!(settings.reset_to_defaults().is_err());
        assert_eq!(settings.params(), &AnimationParams::default());
    }
}
