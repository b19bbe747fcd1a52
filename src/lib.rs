pub mod anchors;
pub mod animation;
pub mod app;
pub mod camera3d;
pub mod cli;
pub mod config;
pub mod events;
pub mod input;
pub mod loading;
pub mod model;
pub mod occlusion;
pub mod overlay;
pub mod params;
pub mod prefs;
pub mod renderer;
pub mod selection;
pub mod time;
pub mod viewer;

pub use app::{run, run_with_overrides, App};

pub(crate) fn wrap_angle(mut radians: f32) -> f32 {
    let two_pi = 2.0 * std::f32::consts::PI;
    while radians > std::f32::consts::PI {
        radians -= two_pi;
    }
    while radians < -std::f32::consts::PI {
        radians += two_pi;
    }
    radians
}
