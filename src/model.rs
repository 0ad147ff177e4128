use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type RecordId = u32;

/// A fixture row shown by a collection panel.
pub trait Record {
    fn id(&self) -> RecordId;
    fn name(&self) -> &str;

    /// Fields consulted by the free-text filter.
    fn search_fields(&self) -> Vec<&str>;

    fn headers() -> &'static [&'static str];

    fn columns(&self) -> Vec<String>;

    fn detail_lines(&self) -> Vec<String>;

    fn matches_filter(&self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return true;
        }

        let query_lower = query.to_lowercase();
        self.search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(&query_lower))
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Application {
    pub id: RecordId,
    pub name: String,
    pub uri: String,
    pub last_update: String,
    pub owner: String,
    pub creator: String,
    pub last_updater: String,
    pub last_commit_id: String,
    pub last_commit_log: String,
    pub pod_count: u32,
    pub cpu: String,
    pub memory: String,
    pub secret_count: u32,
}

impl Record for Application {
    fn id(&self) -> RecordId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.owner.as_str()]
    }

    fn headers() -> &'static [&'static str] {
        &["Name", "Last Update", "Owner", "ArgoCD URL"]
    }

    fn columns(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.last_update.clone(),
            self.owner.clone(),
            self.uri.clone(),
        ]
    }

    fn detail_lines(&self) -> Vec<String> {
        vec![
            format!("Creator:         {}", self.creator),
            format!("Last Updater:    {}", self.last_updater),
            format!("Last Commit ID:  {}", self.last_commit_id),
            format!("Last Commit Log: {}", self.last_commit_log),
            format!("Pod Count:       {}", self.pod_count),
            format!("CPU:             {}", self.cpu),
            format!("Memory:          {}", self.memory),
            format!("Secret Count:    {}", self.secret_count),
        ]
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SourceKind {
    Git,
    Helm,
}

impl SourceKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Git => "git",
            Self::Helm => "helm",
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct KustomizationSource {
    pub kind: SourceKind,
    pub url: String,
    pub branch: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct ResourceCounts {
    pub deployments: u32,
    pub services: u32,
    pub configmaps: u32,
    pub secrets: u32,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum EventKind {
    Normal,
    Warning,
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "Normal"),
            Self::Warning => write!(f, "Warning"),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct KustomizationEvent {
    pub time: String,
    pub kind: EventKind,
    pub reason: String,
    pub message: String,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Kustomization {
    pub id: RecordId,
    pub name: String,
    pub path: String,
    pub validated: bool,
    pub owner: String,
    pub environments: Vec<String>,
    pub last_applied: String,
    pub source: KustomizationSource,
    pub resources: ResourceCounts,
    pub events: Vec<KustomizationEvent>,
}

impl Kustomization {
    pub fn validation_label(&self) -> &'static str {
        if self.validated {
            "Validated"
        } else {
            "Not Validated"
        }
    }
}

impl Record for Kustomization {
    fn id(&self) -> RecordId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.path.as_str(), self.owner.as_str()]
    }

    fn headers() -> &'static [&'static str] {
        &[
            "Name",
            "Path",
            "Validated",
            "Owner",
            "Source",
            "Environments",
        ]
    }

    fn columns(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.path.clone(),
            self.validation_label().to_string(),
            self.owner.clone(),
            self.source.kind.label().to_string(),
            self.environments.join(","),
        ]
    }

    fn detail_lines(&self) -> Vec<String> {
        let mut lines = vec![
            "General".to_string(),
            format!("  Path:         {}", self.path),
            format!("  Validation:   {}", self.validation_label()),
            format!("  Last Applied: {}", format_timestamp(&self.last_applied)),
            String::new(),
            "Source".to_string(),
            format!("  Type:   {}", self.source.kind.label()),
            format!("  URL:    {}", self.source.url),
        ];
        if let Some(branch) = &self.source.branch {
            lines.push(format!("  Branch: {branch}"));
        }
        if let Some(tag) = &self.source.tag {
            lines.push(format!("  Tag:    {tag}"));
        }
        lines.push(String::new());
        lines.push("Resources".to_string());
        lines.push(format!(
            "  Deployments {}  Services {}  ConfigMaps {}  Secrets {}",
            self.resources.deployments,
            self.resources.services,
            self.resources.configmaps,
            self.resources.secrets
        ));
        lines.push(String::new());
        lines.push("Events".to_string());
        if self.events.is_empty() {
            lines.push("  (none)".to_string());
        }
        for event in &self.events {
            lines.push(format!(
                "  {}  {:<7}  {:<10}  {}",
                format_timestamp(&event.time),
                event.kind,
                event.reason,
                event.message
            ));
        }
        lines
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Secret {
    pub id: RecordId,
    pub name: String,
    pub kind: String,
    pub created_at: String,
    pub last_updated: String,
}

impl Record for Secret {
    fn id(&self) -> RecordId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.kind.as_str()]
    }

    fn headers() -> &'static [&'static str] {
        &["Name", "Type", "Created At", "Last Updated"]
    }

    fn columns(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.kind.clone(),
            self.created_at.clone(),
            self.last_updated.clone(),
        ]
    }

    fn detail_lines(&self) -> Vec<String> {
        vec![
            format!("Name:         {}", self.name),
            format!("Type:         {}", self.kind),
            format!("Created At:   {}", self.created_at),
            format!("Last Updated: {}", self.last_updated),
            String::new(),
            "Values are held in Vault and never rendered here.".to_string(),
        ]
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum NodeStatus {
    Ready,
    NotReady,
}

impl NodeStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Ready => "Ready",
            Self::NotReady => "NotReady",
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Node {
    pub id: RecordId,
    pub name: String,
    pub ip: String,
    pub status: NodeStatus,
    pub cpu: String,
    pub memory: String,
}

impl Record for Node {
    fn id(&self) -> RecordId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.ip.as_str()]
    }

    fn headers() -> &'static [&'static str] {
        &["Name", "IP", "Status", "CPU", "Memory"]
    }

    fn columns(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.ip.clone(),
            self.status.label().to_string(),
            self.cpu.clone(),
            self.memory.clone(),
        ]
    }

    fn detail_lines(&self) -> Vec<String> {
        vec![
            format!("Name:   {}", self.name),
            format!("IP:     {}", self.ip),
            format!("Status: {}", self.status.label()),
            format!(
                "CPU:    {} ({}m)",
                self.cpu,
                parse_quantity(&self.cpu) as u64
            ),
            format!(
                "Memory: {} ({}Mi)",
                self.memory,
                parse_quantity(&self.memory) as u64
            ),
        ]
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum WorkflowPhase {
    Succeeded,
    Running,
    Failed,
    Pending,
}

impl WorkflowPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Succeeded => "Succeeded",
            Self::Running => "Running",
            Self::Failed => "Failed",
            Self::Pending => "Pending",
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Workflow {
    pub id: RecordId,
    pub name: String,
    pub phase: WorkflowPhase,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub duration: String,
    pub progress: String,
    pub message: String,
}

impl Record for Workflow {
    fn id(&self) -> RecordId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.phase.label()]
    }

    fn headers() -> &'static [&'static str] {
        &[
            "Name",
            "Status",
            "Started At",
            "Duration",
            "Progress",
            "Message",
        ]
    }

    fn columns(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.phase.label().to_string(),
            self.started_at
                .as_deref()
                .map(format_timestamp)
                .unwrap_or_else(|| "-".to_string()),
            self.duration.clone(),
            self.progress.clone(),
            self.message.clone(),
        ]
    }

    fn detail_lines(&self) -> Vec<String> {
        let stamp = |value: &Option<String>| {
            value
                .as_deref()
                .map(format_timestamp)
                .unwrap_or_else(|| "-".to_string())
        };
        vec![
            format!("Name:     {}", self.name),
            format!("Status:   {}", self.phase.label()),
            format!("Started:  {}", stamp(&self.started_at)),
            format!("Finished: {}", stamp(&self.finished_at)),
            format!("Duration: {}", self.duration),
            format!("Progress: {}", self.progress),
            format!("Message:  {}", self.message),
        ]
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct WorkflowTemplate {
    pub id: RecordId,
    pub name: String,
    pub description: String,
    pub created_at: String,
}

impl Record for WorkflowTemplate {
    fn id(&self) -> RecordId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.description.as_str()]
    }

    fn headers() -> &'static [&'static str] {
        &["Name", "Description", "Created At"]
    }

    fn columns(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.description.clone(),
            self.created_at.clone(),
        ]
    }

    fn detail_lines(&self) -> Vec<String> {
        vec![
            format!("Name:        {}", self.name),
            format!("Description: {}", self.description),
            format!("Created At:  {}", self.created_at),
        ]
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VirtualService {
    pub id: RecordId,
    pub name: String,
    pub hosts: Vec<String>,
    pub gateways: Vec<String>,
    pub created_at: String,
}

impl Record for VirtualService {
    fn id(&self) -> RecordId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.hosts.iter().map(String::as_str));
        fields
    }

    fn headers() -> &'static [&'static str] {
        &["Name", "Hosts", "Gateways", "Created At"]
    }

    fn columns(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.hosts.join(","),
            self.gateways.join(","),
            self.created_at.clone(),
        ]
    }

    fn detail_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("Name: {}", self.name), "Hosts:".to_string()];
        lines.extend(self.hosts.iter().map(|host| format!("  - {host}")));
        lines.push("Gateways:".to_string());
        lines.extend(self.gateways.iter().map(|gateway| format!("  - {gateway}")));
        lines.push(format!("Created At: {}", self.created_at));
        lines
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ResourceQuota {
    pub cpu: String,
    pub memory: String,
    pub storage: String,
}

/// Per-target quota defaults. Values are unit-less strings: cores, GiB, GiB,
/// and plain counts.
#[derive(Debug, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
pub struct ClusterQuota {
    pub cpu: String,
    pub memory: String,
    pub storage: String,
    pub pvcs: String,
    pub nodeports: String,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub secret_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BillingLine {
    pub name: &'static str,
    pub amount: f64,
}

/// Converts a display quantity into base units: cores become millicores and
/// memory becomes MiB. Unparsable input yields zero.
pub fn parse_quantity(value: &str) -> f64 {
    let trimmed = value.trim();
    let numeric_end = trimmed
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map(|(index, _)| index)
        .unwrap_or(trimmed.len());
    let Ok(number) = trimmed[..numeric_end].parse::<f64>() else {
        return 0.0;
    };

    if trimmed.contains("Gi") {
        number * 1024.0
    } else if trimmed.contains("Mi") {
        number
    } else if trimmed.contains("core") {
        number * 1000.0
    } else {
        number
    }
}

/// Renders an RFC 3339 timestamp in local time, or returns the input as-is.
pub fn format_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|stamp| {
            stamp
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::{Application, Record, format_timestamp, parse_quantity};

    fn app(name: &str, owner: &str) -> Application {
        Application {
            id: 1,
            name: name.to_string(),
            uri: format!("/apps/{name}"),
            last_update: "2023-04-01".to_string(),
            owner: owner.to_string(),
            creator: "c".to_string(),
            last_updater: "u".to_string(),
            last_commit_id: "abc".to_string(),
            last_commit_log: "log".to_string(),
            pod_count: 1,
            cpu: "1 core".to_string(),
            memory: "1Gi".to_string(),
            secret_count: 0,
        }
    }

    #[test]
    fn filter_matches_name_or_owner_case_insensitively() {
        let record = app("argo-rollout", "Jane Smith");
        assert!(record.matches_filter("ROLL"));
        assert!(record.matches_filter("jane"));
        assert!(record.matches_filter("  "));
        assert!(!record.matches_filter("/apps"));
    }

    #[test]
    fn quantities_convert_to_base_units() {
        assert_eq!(parse_quantity("10 cores"), 10_000.0);
        assert_eq!(parse_quantity("1 core"), 1_000.0);
        assert_eq!(parse_quantity("32Gi"), 32_768.0);
        assert_eq!(parse_quantity("512Mi"), 512.0);
        assert_eq!(parse_quantity("7"), 7.0);
        assert_eq!(parse_quantity("n/a"), 0.0);
    }

    #[test]
    fn unparsable_timestamps_pass_through() {
        assert_eq!(format_timestamp("2023-06-01"), "2023-06-01");
        assert_ne!(format_timestamp("2024-03-15T10:30:00Z"), "2024-03-15T10:30:00Z");
    }
}
