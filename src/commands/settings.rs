use crate::models::alert::AlertThresholds;
use crate::models::comparison::ComparisonThresholds;
use crate::models::page::PageDiffOptions;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const SETTINGS_SCHEMA_VERSION: i64 = 2;
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonSettings {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub output_format: String,
    pub thresholds: ComparisonThresholds,
}

pub fn get_settings(config_dir: &str) -> Result<Value, String> {
    load_settings_from_disk(config_dir)
}

pub fn save_settings(config_dir: &str, settings: Value) -> Result<Value, String> {
    save_settings_to_disk(config_dir, settings)
}

pub fn load_effective_settings(config_dir: &str) -> Result<ComparisonSettings, String> {
    let settings = load_settings_from_disk(config_dir)?;
    Ok(effective_settings(&settings))
}

/// Typed view of an already sanitized settings object.
pub fn effective_settings(settings: &Value) -> ComparisonSettings {
    let u64_of = |key: &str, default: u64| settings.get(key).and_then(Value::as_u64).unwrap_or(default);
    let f64_of = |key: &str, default: f64| settings.get(key).and_then(Value::as_f64).unwrap_or(default);

    let exit_increase = f64_of("exitAlertThreshold", 10.0);
    ComparisonSettings {
        api_base_url: settings
            .get("apiBaseUrl")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_API_BASE_URL)
            .to_string(),
        request_timeout: Duration::from_secs(u64_of("requestTimeoutSecs", 30)),
        output_format: settings
            .get("outputFormat")
            .and_then(Value::as_str)
            .unwrap_or("text")
            .to_string(),
        thresholds: ComparisonThresholds {
            top_n: u64_of("topN", 20) as usize,
            issue_noise_floor: f64_of("issueNoiseFloor", 1.0),
            pages: PageDiffOptions {
                min_views: u64_of("pageMinViews", 20),
                change_threshold: f64_of("pageChangeThreshold", 5.0),
                time_clamp: f64_of("pageTimeClamp", 1800.0),
            },
            alerts: AlertThresholds {
                exit_increase,
                exit_increase_critical: f64_of("exitAlertCriticalThreshold", 20.0).max(exit_increase),
            },
        },
    }
}

pub fn load_settings_from_disk(config_dir: &str) -> Result<Value, String> {
    let path = settings_path(config_dir);
    ensure_uxlens_dir(config_dir)?;

    let original = if path.exists() {
        let raw = fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read settings.json: {}", e))?;
        serde_json::from_str::<Value>(&raw).unwrap_or_else(|e| {
            log::warn!("settings.json is not valid JSON, using defaults: {}", e);
            json!({})
        })
    } else {
        json!({})
    };

    let migrated = migrate_settings(original.clone());
    if migrated != original || !path.exists() {
        write_settings_file(&path, &migrated)?;
    }

    Ok(migrated)
}

pub fn save_settings_to_disk(config_dir: &str, settings: Value) -> Result<Value, String> {
    let path = settings_path(config_dir);
    ensure_uxlens_dir(config_dir)?;

    let mut merged = load_settings_from_disk(config_dir).unwrap_or_else(|_| default_settings());
    merge_settings(&mut merged, &settings);

    let migrated = migrate_settings(merged);
    write_settings_file(&path, &migrated)?;
    log::info!("settings saved to {}", path.display());
    Ok(migrated)
}

fn settings_path(config_dir: &str) -> PathBuf {
    Path::new(config_dir).join(".uxlens").join("settings.json")
}

fn ensure_uxlens_dir(config_dir: &str) -> Result<(), String> {
    let dir = Path::new(config_dir).join(".uxlens");
    fs::create_dir_all(&dir)
        .map_err(|e| format!("Failed to create .uxlens directory: {}", e))
}

fn write_settings_file(path: &Path, settings: &Value) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {}", e))?;
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write settings.json: {}", e))
}

fn migrate_settings(input: Value) -> Value {
    let mut out = match input {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };

    let version = out
        .get("schema_version")
        .and_then(Value::as_i64)
        .unwrap_or(0);

    if version < 1 {
        rename_legacy_base_url(&mut out);
    }

    if version < 2 {
        // V2 splits the single alert threshold into warning and critical levels.
        migrate_exit_alert_threshold(&mut out);
    }

    deep_merge_defaults(&mut out, &default_settings());
    sanitize_settings(&mut out);
    if let Some(obj) = out.as_object_mut() {
        obj.insert("schema_version".to_string(), json!(SETTINGS_SCHEMA_VERSION));
    }

    out
}

fn default_settings() -> Value {
    json!({
        "schema_version": SETTINGS_SCHEMA_VERSION,
        "apiBaseUrl": DEFAULT_API_BASE_URL,
        "requestTimeoutSecs": 30,
        "outputFormat": "text",
        "topN": 20,
        "issueNoiseFloor": 1.0,
        "pageMinViews": 20,
        "pageChangeThreshold": 5.0,
        "pageTimeClamp": 1800.0,
        "exitAlertThreshold": 10.0,
        "exitAlertCriticalThreshold": 20.0
    })
}

fn deep_merge_defaults(target: &mut Value, defaults: &Value) {
    let (Some(target_obj), Some(default_obj)) = (target.as_object_mut(), defaults.as_object()) else {
        return;
    };

    for (key, default_value) in default_obj {
        match target_obj.get_mut(key) {
            Some(existing) => {
                if existing.is_object() && default_value.is_object() {
                    deep_merge_defaults(existing, default_value);
                }
            }
            None => {
                target_obj.insert(key.clone(), default_value.clone());
            }
        }
    }
}

fn merge_settings(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(target_obj), Value::Object(incoming_obj)) => {
            for (key, value) in incoming_obj {
                if let Some(existing) = target_obj.get_mut(key) {
                    merge_settings(existing, value);
                } else {
                    target_obj.insert(key.clone(), value.clone());
                }
            }
        }
        (target_slot, incoming_value) => {
            *target_slot = incoming_value.clone();
        }
    }
}

fn rename_legacy_base_url(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };
    if let Some(legacy) = obj.remove("apiBase") {
        obj.entry("apiBaseUrl".to_string()).or_insert(legacy);
    }
}

fn migrate_exit_alert_threshold(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };
    if let Some(legacy) = obj.remove("exitAlertPp") {
        obj.entry("exitAlertThreshold".to_string()).or_insert(legacy);
    }
}

fn sanitize_settings(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    sanitize_base_url(obj);

    // Clamp numerics.
    clamp_u64(obj, "requestTimeoutSecs", 1, 300, 30);
    clamp_u64(obj, "topN", 1, 200, 20);
    clamp_u64(obj, "pageMinViews", 0, 10_000, 20);
    clamp_f64(obj, "issueNoiseFloor", 0.0, 100.0, 1.0);
    clamp_f64(obj, "pageChangeThreshold", 0.0, 100.0, 5.0);
    clamp_f64(obj, "pageTimeClamp", 60.0, 86_400.0, 1800.0);
    clamp_f64(obj, "exitAlertThreshold", 0.0, 100.0, 10.0);
    clamp_f64(obj, "exitAlertCriticalThreshold", 0.0, 100.0, 20.0);

    // Critical level never sits below the warning level.
    let warning = obj.get("exitAlertThreshold").and_then(Value::as_f64).unwrap_or(10.0);
    let critical = obj
        .get("exitAlertCriticalThreshold")
        .and_then(Value::as_f64)
        .unwrap_or(20.0);
    if critical < warning {
        obj.insert("exitAlertCriticalThreshold".to_string(), json!(warning));
    }

    sanitize_enum(obj, "outputFormat", &["text", "json"], "text");
}

fn sanitize_base_url(map: &mut Map<String, Value>) {
    let valid = map
        .get("apiBaseUrl")
        .and_then(Value::as_str)
        .map(|raw| raw.trim().trim_end_matches('/'))
        .filter(|raw| {
            Url::parse(raw)
                .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
                .unwrap_or(false)
        })
        .unwrap_or(DEFAULT_API_BASE_URL)
        .to_string();
    map.insert("apiBaseUrl".to_string(), json!(valid));
}

fn clamp_u64(map: &mut Map<String, Value>, key: &str, min: u64, max: u64, default: u64) {
    let raw = map.get(key).and_then(Value::as_u64).unwrap_or(default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}

fn clamp_f64(map: &mut Map<String, Value>, key: &str, min: f64, max: f64, default: f64) {
    let raw = map
        .get(key)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
        .unwrap_or(default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}

fn sanitize_enum(map: &mut Map<String, Value>, key: &str, allowed: &[&str], default: &str) {
    let valid = map
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| allowed.contains(value))
        .unwrap_or(default);
    map.insert(key.to_string(), json!(valid));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrates_legacy_keys() {
        let input = json!({
            "apiBase": "https://analytics.example.com/api/",
            "exitAlertPp": 12
        });

        let migrated = migrate_settings(input);
        assert_eq!(migrated["apiBaseUrl"], json!("https://analytics.example.com/api"));
        assert!(migrated.get("apiBase").is_none());
        assert_eq!(migrated["exitAlertThreshold"], json!(12.0));
        assert_eq!(
            migrated
                .get("schema_version")
                .and_then(Value::as_i64)
                .unwrap(),
            SETTINGS_SCHEMA_VERSION
        );
    }

    #[test]
    fn merges_partial_settings_without_losing_existing_values() {
        let mut existing = default_settings();
        merge_settings(&mut existing, &json!({ "topN": 50 }));
        let migrated = migrate_settings(existing);

        assert_eq!(migrated["topN"], json!(50));
        assert_eq!(migrated["requestTimeoutSecs"], json!(30));
        assert_eq!(migrated["apiBaseUrl"], json!(DEFAULT_API_BASE_URL));
    }

    #[test]
    fn sanitizes_out_of_range_values() {
        let migrated = migrate_settings(json!({
            "schema_version": 2,
            "apiBaseUrl": "ftp://nope",
            "topN": 0,
            "requestTimeoutSecs": 9999,
            "exitAlertThreshold": 30,
            "exitAlertCriticalThreshold": 15,
            "outputFormat": "yaml"
        }));

        assert_eq!(migrated["apiBaseUrl"], json!(DEFAULT_API_BASE_URL));
        assert_eq!(migrated["topN"], json!(1));
        assert_eq!(migrated["requestTimeoutSecs"], json!(300));
        assert_eq!(migrated["exitAlertCriticalThreshold"], json!(30.0));
        assert_eq!(migrated["outputFormat"], json!("text"));
    }

    #[test]
    fn effective_settings_default_to_comparison_thresholds() {
        let settings = effective_settings(&migrate_settings(json!({})));
        assert_eq!(settings.thresholds, ComparisonThresholds::default());
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
        assert_eq!(settings.api_base_url, DEFAULT_API_BASE_URL);
    }
}
