use env_logger::{Builder, Env};
use hotspot_viewer::cli::CliOverrides;
use hotspot_viewer::run_with_overrides;

fn main() {
    Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli_overrides = match CliOverrides::parse_from_env() {
        Ok(parsed) => parsed.into_config_overrides(),
        Err(err) => {
            eprintln!("[cli] {err}");
            std::process::exit(2);
        }
    };
    if let Err(err) = pollster::block_on(run_with_overrides(cli_overrides)) {
        log::error!("Application error: {err:?}");
        std::process::exit(1);
    }
}
