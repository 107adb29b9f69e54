//! Reads/writes `~/.turtleweb/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Persisted user configuration stored in `~/.turtleweb/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// WebSocket URL of the rosbridge server.
    #[serde(default = "default_rosbridge_url")]
    pub rosbridge_url: String,

    /// HTTP port for the control panel web UI.
    #[serde(default = "default_panel_port")]
    pub panel_port: u16,

    /// Node name the simulation registers under, used for parameter calls.
    #[serde(default = "default_node_name")]
    pub node_name: String,

    /// ROS 2 package holding the simulation executable.
    #[serde(default = "default_launch_package")]
    pub launch_package: String,

    /// Executable started by the launch button.
    #[serde(default = "default_launch_executable")]
    pub launch_executable: String,
}

fn default_rosbridge_url() -> String {
    "ws://localhost:9090".to_string()
}
fn default_panel_port() -> u16 {
    8080
}
fn default_node_name() -> String {
    "turtlesim".to_string()
}
fn default_launch_package() -> String {
    "turtlesim".to_string()
}
fn default_launch_executable() -> String {
    "turtlesim_node".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rosbridge_url: default_rosbridge_url(),
            panel_port: default_panel_port(),
            node_name: default_node_name(),
            launch_package: default_launch_package(),
            launch_executable: default_launch_executable(),
        }
    }
}

/// Return the path to `~/.turtleweb/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
/// Extracted for testability without mutating environment variables.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".turtleweb").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `TURTLEWEB_*` environment variable overrides to `cfg`.
///
/// Supported variables:
///
/// | Variable | Config field |
/// |---|---|
/// | `TURTLEWEB_ROSBRIDGE_URL` | `rosbridge_url` |
/// | `TURTLEWEB_PANEL_PORT` | `panel_port` |
/// | `TURTLEWEB_NODE_NAME` | `node_name` |
/// | `TURTLEWEB_LAUNCH_PACKAGE` | `launch_package` |
/// | `TURTLEWEB_LAUNCH_EXECUTABLE` | `launch_executable` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("TURTLEWEB_ROSBRIDGE_URL") {
        cfg.rosbridge_url = v;
    }
    if let Ok(v) = std::env::var("TURTLEWEB_PANEL_PORT")
        && let Ok(port) = v.parse::<u16>()
    {
        cfg.panel_port = port;
    }
    if let Ok(v) = std::env::var("TURTLEWEB_NODE_NAME") {
        cfg.node_name = v;
    }
    if let Ok(v) = std::env::var("TURTLEWEB_LAUNCH_PACKAGE") {
        cfg.launch_package = v;
    }
    if let Ok(v) = std::env::var("TURTLEWEB_LAUNCH_EXECUTABLE") {
        cfg.launch_executable = v;
    }
}

/// Save the config to disk, creating `~/.turtleweb/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let cfg = Config::default();
        save_to(&cfg, &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.rosbridge_url, "ws://localhost:9090");
        assert_eq!(loaded.panel_port, 8080);
        assert_eq!(loaded.node_name, "turtlesim");
        assert_eq!(loaded.launch_package, "turtlesim");
        assert_eq!(loaded.launch_executable, "turtlesim_node");
    }

    #[test]
    fn config_path_points_to_turtleweb_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".turtleweb"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        let result = load_from(&path).expect("no error");
        assert!(result.is_none());
    }

    #[test]
    fn partial_file_falls_back_to_field_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        fs::create_dir_all(path.parent().unwrap()).expect("mkdir");
        fs::write(&path, "panel_port = 9000\n").expect("write");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.panel_port, 9000);
        assert_eq!(loaded.rosbridge_url, "ws://localhost:9090");
    }

    #[test]
    fn apply_env_overrides_changes_rosbridge_url() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("TURTLEWEB_ROSBRIDGE_URL", "ws://robot-host:9090") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.rosbridge_url, "ws://robot-host:9090");
        unsafe { std::env::remove_var("TURTLEWEB_ROSBRIDGE_URL") };
    }

    #[test]
    fn apply_env_overrides_changes_panel_port() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("TURTLEWEB_PANEL_PORT", "8181") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.panel_port, 8181);
        unsafe { std::env::remove_var("TURTLEWEB_PANEL_PORT") };
    }

    #[test]
    fn apply_env_overrides_ignores_invalid_port() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("TURTLEWEB_PANEL_PORT", "not-a-port") };
        let mut cfg = Config::default();
        let original_port = cfg.panel_port;
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.panel_port, original_port);
        unsafe { std::env::remove_var("TURTLEWEB_PANEL_PORT") };
    }

    #[test]
    fn apply_env_overrides_changes_launch_target() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("TURTLEWEB_LAUNCH_PACKAGE", "my_sim") };
        unsafe { std::env::set_var("TURTLEWEB_LAUNCH_EXECUTABLE", "my_sim_node") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.launch_package, "my_sim");
        assert_eq!(cfg.launch_executable, "my_sim_node");
        unsafe { std::env::remove_var("TURTLEWEB_LAUNCH_PACKAGE") };
        unsafe { std::env::remove_var("TURTLEWEB_LAUNCH_EXECUTABLE") };
    }
}
