use crate::model::ClusterQuota;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

pub const DEFAULT_VALIDATION_DELAY_MS: u64 = 1_500;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeConfigSnapshot {
    pub source: Option<String>,
    pub validation_delay_ms: Option<u64>,
    pub deploy_targets: BTreeMap<String, ClusterQuota>,
    pub builtin_templates: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfigWatcher {
    path: Option<PathBuf>,
    modified: Option<SystemTime>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct H4ConfigFile {
    #[serde(default, alias = "validation_delay")]
    validation_delay_ms: Option<u64>,
    #[serde(default, alias = "clusters")]
    deploy_targets: BTreeMap<String, QuotaSpec>,
    #[serde(default, alias = "templates")]
    builtin_templates: Vec<String>,
}

/// Quota values may be written as YAML numbers or strings.
#[derive(Debug, Clone, Deserialize, Default)]
struct QuotaSpec {
    #[serde(default)]
    cpu: Option<serde_yaml::Value>,
    #[serde(default)]
    memory: Option<serde_yaml::Value>,
    #[serde(default)]
    storage: Option<serde_yaml::Value>,
    #[serde(default)]
    pvcs: Option<serde_yaml::Value>,
    #[serde(default)]
    nodeports: Option<serde_yaml::Value>,
}

impl QuotaSpec {
    fn into_quota(self) -> ClusterQuota {
        ClusterQuota {
            cpu: scalar_text(self.cpu),
            memory: scalar_text(self.memory),
            storage: scalar_text(self.storage),
            pvcs: scalar_text(self.pvcs),
            nodeports: scalar_text(self.nodeports),
        }
    }
}

fn scalar_text(value: Option<serde_yaml::Value>) -> String {
    match value {
        Some(serde_yaml::Value::String(text)) => text,
        Some(serde_yaml::Value::Number(number)) => number.to_string(),
        Some(serde_yaml::Value::Bool(flag)) => flag.to_string(),
        _ => String::new(),
    }
}

impl RuntimeConfigWatcher {
    pub fn discover() -> Self {
        Self {
            path: discover_config_path(),
            modified: None,
        }
    }

    pub fn load_current(&mut self) -> Result<RuntimeConfigSnapshot> {
        let Some(path) = self.path.clone() else {
            return Ok(RuntimeConfigSnapshot::default());
        };

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read runtime config {}", path.display()))?;
        let mut snapshot = parse_config(&raw)
            .with_context(|| format!("failed to parse runtime config {}", path.display()))?;
        self.modified = fs::metadata(&path)
            .ok()
            .and_then(|meta| meta.modified().ok());

        snapshot.source = Some(path.display().to_string());
        Ok(snapshot)
    }

    pub fn reload_if_changed(&mut self) -> Result<Option<RuntimeConfigSnapshot>> {
        let Some(current_path) = self.path.clone() else {
            self.path = discover_config_path();
            if self.path.is_some() {
                return self.load_current().map(Some);
            }
            return Ok(None);
        };

        if !current_path.exists() {
            self.path = discover_config_path();
            self.modified = None;
            if self.path.is_some() {
                return self.load_current().map(Some);
            }
            return Ok(Some(RuntimeConfigSnapshot::default()));
        }

        let modified = fs::metadata(&current_path)
            .ok()
            .and_then(|meta| meta.modified().ok());
        if modified != self.modified {
            return self.load_current().map(Some);
        }

        Ok(None)
    }
}

fn parse_config(raw: &str) -> Result<RuntimeConfigSnapshot> {
    if raw.trim().is_empty() {
        return Ok(RuntimeConfigSnapshot::default());
    }
    let parsed: H4ConfigFile = serde_yaml::from_str(raw)?;

    let deploy_targets = parsed
        .deploy_targets
        .into_iter()
        .map(|(name, spec)| (name.trim().to_uppercase(), spec.into_quota()))
        .filter(|(name, _)| !name.is_empty())
        .collect();
    let builtin_templates = parsed
        .builtin_templates
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();

    Ok(RuntimeConfigSnapshot {
        source: None,
        validation_delay_ms: parsed.validation_delay_ms,
        deploy_targets,
        builtin_templates,
    })
}

fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("H4DECK_CONFIG")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let cwd_candidates = [PathBuf::from("h4deck.yaml"), PathBuf::from(".h4deck.yaml")];
    for candidate in cwd_candidates {
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let candidate = PathBuf::from(home).join(".config/h4deck/config.yaml");
        if candidate.exists() {
            return Some(candidate);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::parse_config;

    #[test]
    fn empty_file_yields_defaults() {
        let snapshot = parse_config("  \n").expect("empty config");
        assert_eq!(snapshot.validation_delay_ms, None);
        assert!(snapshot.deploy_targets.is_empty());
        assert!(snapshot.builtin_templates.is_empty());
    }

    #[test]
    fn quotas_accept_numbers_and_strings() {
        let raw = r#"
validation_delay_ms: 250
deploy_targets:
  uat:
    cpu: 6
    memory: "12"
    storage: 60
    pvcs: 4
    nodeports: 2
  DR:
    cpu: 1
builtin_templates:
  - web-service
  - " "
  - batch
"#;
        let snapshot = parse_config(raw).expect("valid config");
        assert_eq!(snapshot.validation_delay_ms, Some(250));

        let uat = snapshot.deploy_targets.get("UAT").expect("uat override");
        assert_eq!(uat.cpu, "6");
        assert_eq!(uat.memory, "12");
        assert_eq!(uat.pvcs, "4");

        let dr = snapshot.deploy_targets.get("DR").expect("dr target");
        assert_eq!(dr.storage, "");
        assert_eq!(snapshot.builtin_templates, vec!["web-service", "batch"]);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(parse_config("deploy_targets: [1, 2").is_err());
    }
}
