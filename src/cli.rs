use crate::config::AppConfigOverrides;
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CliOverrides {
    width: Option<u32>,
    height: Option<u32>,
    vsync: Option<bool>,
    model: Option<PathBuf>,
    anchors: Option<PathBuf>,
    prefs: Option<PathBuf>,
    ephemeral: Option<bool>,
}

const SUPPORTED_FLAGS: &str = "--width, --height, --vsync, --model, --anchors, --prefs, --ephemeral";

impl CliOverrides {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            let Some(key) = flag.strip_prefix("--") else {
                bail!("Unexpected argument '{flag}'. Flags take the form --name value.");
            };
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "width" => {
                    overrides.width =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid width '{value}'"))?);
                }
                "height" => {
                    overrides.height =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid height '{value}'"))?);
                }
                "vsync" => overrides.vsync = Some(parse_bool_flag("vsync", &value)?),
                "model" => overrides.model = Some(parse_path_flag("model", &value)?),
                "anchors" => overrides.anchors = Some(parse_path_flag("anchors", &value)?),
                "prefs" => overrides.prefs = Some(parse_path_flag("prefs", &value)?),
                "ephemeral" => overrides.ephemeral = Some(parse_bool_flag("ephemeral", &value)?),
                _ => bail!("Unknown flag '{flag}'. Supported flags: {SUPPORTED_FLAGS}."),
            }
        }
        Ok(overrides)
    }

    pub fn into_config_overrides(self) -> AppConfigOverrides {
        AppConfigOverrides {
            width: self.width,
            height: self.height,
            vsync: self.vsync,
            model_path: self.model,
            anchors_path: self.anchors,
            prefs_path: self.prefs,
            ephemeral_prefs: self.ephemeral,
        }
    }

    #[cfg(test)]
    pub fn as_tuple(&self) -> (Option<u32>, Option<u32>, Option<bool>) {
        (self.width, self.height, self.vsync)
    }
}

fn parse_bool_flag(flag: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => bail!("Invalid {flag} value '{other}'. Use on/off or true/false."),
    }
}

fn parse_path_flag(flag: &str, value: &str) -> Result<PathBuf> {
    if value.trim().is_empty() || value.starts_with("--") {
        bail!("Invalid {flag} path '{value}'");
    }
    Ok(PathBuf::from(value))
}
