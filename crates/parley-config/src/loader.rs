use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::Config;

/// Ordered list of config file locations searched from lowest to highest priority.
/// Later files override earlier ones.
fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/parley/config.toml")];

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".config/parley/config.toml"));
    }
    if let Some(cfg) = dirs::config_dir() {
        let p = cfg.join("parley/config.toml");
        if !paths.contains(&p) {
            paths.push(p);
        }
    }

    paths.push(PathBuf::from(".parley/config.toml"));
    paths.push(PathBuf::from("parley.toml"));

    paths
}

fn read_layer(path: &Path) -> anyhow::Result<toml::Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Load configuration by merging all discovered TOML files.
/// The `extra` argument may provide an explicit path (e.g. `--config` CLI flag).
pub fn load(extra: Option<&Path>) -> anyhow::Result<Config> {
    load_from(&config_search_paths(), extra)
}

fn load_from(search: &[PathBuf], extra: Option<&Path>) -> anyhow::Result<Config> {
    let mut merged = toml::Value::Table(toml::map::Map::new());

    for path in search.iter().filter(|p| p.is_file()) {
        debug!(path = %path.display(), "loading config layer");
        merge_toml(&mut merged, read_layer(path)?);
    }

    if let Some(p) = extra {
        debug!(path = %p.display(), "loading explicit config");
        merge_toml(&mut merged, read_layer(p)?);
    }

    let config: Config = merged.try_into().context("invalid configuration")?;
    Ok(config)
}

/// Deep-merge `src` into `dst`; src wins on scalar conflicts.
fn merge_toml(dst: &mut toml::Value, src: toml::Value) {
    match (dst, src) {
        (toml::Value::Table(d), toml::Value::Table(s)) => {
            for (k, v) in s {
                match d.get_mut(&k) {
                    Some(existing) => merge_toml(existing, v),
                    None => {
                        d.insert(k, v);
                    }
                }
            }
        }
        (dst, src) => *dst = src,
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn val(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    fn write_tmp(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{body}").unwrap();
        f
    }

    #[test]
    fn merge_scalar_src_wins() {
        let mut dst = val(r#"x = 1"#);
        merge_toml(&mut dst, val(r#"x = 2"#));
        assert_eq!(dst["x"].as_integer(), Some(2));
    }

    #[test]
    fn merge_nested_tables() {
        let mut dst = val(r#"[server]
url = "ws://a/ws"
connect_timeout_secs = 3"#);
        merge_toml(&mut dst, val(r#"[server]
url = "ws://b/ws""#));
        assert_eq!(dst["server"]["url"].as_str(), Some("ws://b/ws"));
        assert_eq!(dst["server"]["connect_timeout_secs"].as_integer(), Some(3));
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let result = load_from(&[], Some(Path::new("/tmp/parley_nonexistent_config_xyz.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn no_layers_yields_defaults() {
        let cfg = load_from(&[], None).unwrap();
        assert_eq!(cfg.reconnect.max_attempts, 5);
        assert_eq!(cfg.defaults.provider, "anthropic");
    }

    #[test]
    fn later_layer_overrides_earlier() {
        let base = write_tmp(
            r#"[server]
url = "ws://base:8080/ws"
[defaults]
temperature = 0.2"#,
        );
        let local = write_tmp(
            r#"[server]
url = "ws://local:9000/ws""#,
        );
        let cfg = load_from(&[base.path().to_path_buf(), local.path().to_path_buf()], None).unwrap();
        assert_eq!(cfg.server.url, "ws://local:9000/ws");
        assert!((cfg.defaults.temperature - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn explicit_file_wins_over_search_paths() {
        let base = write_tmp("[headless]\nresponse_timeout_secs = 30\n");
        let explicit = write_tmp("[headless]\nresponse_timeout_secs = 5\n");
        let cfg = load_from(&[base.path().to_path_buf()], Some(explicit.path())).unwrap();
        assert_eq!(cfg.headless.response_timeout_secs, 5);
    }

    #[test]
    fn wrong_value_type_is_reported() {
        let bad = write_tmp("[reconnect]\nmax_attempts = \"many\"\n");
        assert!(load_from(&[], Some(bad.path())).is_err());
    }
}
