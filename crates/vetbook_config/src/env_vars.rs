//! Environment variable naming for Vetbook configuration.
//!
//! Plain settings use `VETBOOK__SECTION__KEY` and are picked up by the
//! `config` environment source. Secrets use `VETBOOK_SECRET_SECTION_KEY` and
//! are injected wherever the config holds the `"secret_from_env"` marker.

use std::env;

/// The prefix for configuration environment variables
pub const DEFAULT_PREFIX: &str = "VETBOOK";

/// The prefix for secret environment variables
pub const SECRET_PREFIX: &str = "VETBOOK_SECRET";

/// The separator for configuration environment variables
pub const CONFIG_SEPARATOR: &str = "__";

/// The separator for secret environment variables
pub const SECRET_SEPARATOR: &str = "_";

/// Marker value that asks for a secret to be read from the environment.
pub const SECRET_MARKER: &str = "secret_from_env";

/// Convert a configuration path to an environment variable name
///
/// `"api.base_url"` becomes `"VETBOOK__API__BASE_URL"`.
pub fn config_path_to_env_var(path: &str) -> String {
    let path = path.replace('.', CONFIG_SEPARATOR);
    format!("{}{}{}", DEFAULT_PREFIX, CONFIG_SEPARATOR, path).to_uppercase()
}

/// Convert a secret path to an environment variable name
///
/// `"session.token"` becomes `"VETBOOK_SECRET_SESSION_TOKEN"`.
pub fn secret_path_to_env_var(path: &str) -> String {
    let path = path.replace('.', SECRET_SEPARATOR);
    format!("{}{}{}", SECRET_PREFIX, SECRET_SEPARATOR, path).to_uppercase()
}

/// Get the environment variable for a secret path, ignoring empty values.
pub fn get_secret_env_var(path: &str) -> Option<String> {
    env::var(secret_path_to_env_var(path))
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// Replace every `"secret_from_env"` string in `value` with its environment
/// variable. Markers without a matching variable become `null` so that
/// optional fields deserialize as `None`.
///
/// Returns `true` if any value was replaced.
pub fn inject_env_vars(value: &mut serde_json::Value) -> bool {
    use serde_json::Value;

    fn walk(path: Vec<String>, obj: &mut Value) -> bool {
        let mut replaced = false;

        match obj {
            Value::Object(map) => {
                for (k, v) in map.iter_mut() {
                    let mut new_path = path.clone();
                    new_path.push(k.to_string());
                    replaced |= walk(new_path, v);
                }
            }
            Value::String(s) if s == SECRET_MARKER => {
                let path_str = path.join(".");
                match get_secret_env_var(&path_str) {
                    Some(env_val) => {
                        *obj = Value::String(env_val);
                        replaced = true;
                    }
                    None => {
                        tracing::warn!(
                            "env var {} not found for secret {}",
                            secret_path_to_env_var(&path_str),
                            path_str
                        );
                        *obj = Value::Null;
                    }
                }
            }
            _ => {}
        }

        replaced
    }

    walk(vec![], value)
}
