use crate::catalog::Catalog;
use crate::model::ClusterQuota;
use crate::verify::{VerificationKind, VerificationRequest, VerificationResponse};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Upper bound for the repeatable sections (repositories, ingress rules).
pub const MAX_LIST_ENTRIES: usize = 2;

/// Number of required fields counted by [`DeployDraft::completion_percent`].
pub const COUNTED_FIELDS: usize = 10;

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
pub struct RepositoryEntry {
    pub url: String,
    pub branch: String,
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
pub struct IngressRule {
    pub name: String,
    pub service: String,
    pub port: String,
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    #[default]
    Builtin,
    External,
}

impl TemplateKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Builtin => "built-in",
            Self::External => "external",
        }
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
pub struct TemplateSource {
    pub kind: TemplateKind,
    pub value: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub instance_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub target_revision: String,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ValidationTarget {
    Repository(usize),
    Template,
    Cluster,
}

/// One in-flight check. Editing or removing the entry it was issued for
/// retires the ticket, and the late outcome is then ignored.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ValidationTicket {
    pub target: ValidationTarget,
    serial: u64,
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub enum ValidationStatus {
    #[default]
    Idle,
    Loading,
    Passed(String),
    Failed(String),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DraftSection {
    Basic,
    Repository,
    Ingress,
    Quota,
    Secrets,
}

impl DraftSection {
    pub fn title(self) -> &'static str {
        match self {
            Self::Basic => "Basic Info",
            Self::Repository => "Repository Source",
            Self::Ingress => "Ingress",
            Self::Quota => "Resource Quota",
            Self::Secrets => "Secrets & Sync",
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FieldInput {
    Text,
    Choice,
    Toggle,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DraftField {
    TenantName,
    AppCode,
    Namespace,
    Description,
    RepositoryUrl(usize),
    RepositoryBranch(usize),
    TemplateKind,
    TemplateValue,
    InstanceName,
    TargetRevision,
    IngressName(usize),
    IngressService(usize),
    IngressPort(usize),
    Target,
    Cpu,
    Memory,
    Storage,
    Pvcs,
    NodePorts,
    UseVault,
    SecretPath,
    AutoSync,
}

impl DraftField {
    pub fn label(self) -> String {
        match self {
            Self::TenantName => "Tenant Name".to_string(),
            Self::AppCode => "App Code".to_string(),
            Self::Namespace => "Namespace".to_string(),
            Self::Description => "Description".to_string(),
            Self::RepositoryUrl(index) => format!("Repo #{} URL", index + 1),
            Self::RepositoryBranch(index) => format!("Repo #{} Branch", index + 1),
            Self::TemplateKind => "Template Source".to_string(),
            Self::TemplateValue => "Template".to_string(),
            Self::InstanceName => "Instance Name".to_string(),
            Self::TargetRevision => "Target Revision".to_string(),
            Self::IngressName(index) => format!("Ingress #{} Name", index + 1),
            Self::IngressService(index) => format!("Ingress #{} Service", index + 1),
            Self::IngressPort(index) => format!("Ingress #{} Port", index + 1),
            Self::Target => "Target Cluster".to_string(),
            Self::Cpu => "CPU (cores)".to_string(),
            Self::Memory => "Memory (GiB)".to_string(),
            Self::Storage => "Storage (GiB)".to_string(),
            Self::Pvcs => "PVCs".to_string(),
            Self::NodePorts => "NodePorts".to_string(),
            Self::UseVault => "Use Vault".to_string(),
            Self::SecretPath => "Secret Path".to_string(),
            Self::AutoSync => "Auto Sync".to_string(),
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            Self::TenantName => "unique identifier for your organization or project",
            Self::AppCode => "application code used for resource tracking",
            Self::Namespace => "Kubernetes namespace the application is deployed to",
            Self::Description => "what the application does",
            Self::RepositoryUrl(_) => "https://github.com/<owner>/<repo>",
            Self::RepositoryBranch(_) => "branch to track",
            Self::TemplateKind => "platform template or your own repository",
            Self::TemplateValue => "template name or repository URL",
            Self::InstanceName => "release name for the external template",
            Self::TargetRevision => "tag, branch or commit of the external template",
            Self::IngressName(_) => "unique name for the ingress rule",
            Self::IngressService(_) => "service to route traffic to",
            Self::IngressPort(_) => "service port",
            Self::Target => "cluster to deploy to; prefills quota defaults",
            Self::Cpu => "1 CPU = 1000m",
            Self::Memory => "maximum RAM in GiB",
            Self::Storage => "persistent volume space in GiB",
            Self::Pvcs => "maximum number of persistent volume claims",
            Self::NodePorts => "maximum number of NodePort services",
            Self::UseVault => "manage application secrets in Vault",
            Self::SecretPath => "tenant secret path in Vault",
            Self::AutoSync => "sync automatically when the repository changes",
        }
    }

    pub fn section(self) -> DraftSection {
        match self {
            Self::TenantName | Self::AppCode | Self::Namespace | Self::Description => {
                DraftSection::Basic
            }
            Self::RepositoryUrl(_)
            | Self::RepositoryBranch(_)
            | Self::TemplateKind
            | Self::TemplateValue
            | Self::InstanceName
            | Self::TargetRevision => DraftSection::Repository,
            Self::IngressName(_) | Self::IngressService(_) | Self::IngressPort(_) => {
                DraftSection::Ingress
            }
            Self::Target
            | Self::Cpu
            | Self::Memory
            | Self::Storage
            | Self::Pvcs
            | Self::NodePorts => DraftSection::Quota,
            Self::UseVault | Self::SecretPath | Self::AutoSync => DraftSection::Secrets,
        }
    }

    pub fn validation_target(self) -> Option<ValidationTarget> {
        match self {
            Self::RepositoryUrl(index) | Self::RepositoryBranch(index) => {
                Some(ValidationTarget::Repository(index))
            }
            Self::TemplateKind | Self::TemplateValue | Self::InstanceName | Self::TargetRevision => {
                Some(ValidationTarget::Template)
            }
            Self::Target
            | Self::Cpu
            | Self::Memory
            | Self::Storage
            | Self::Pvcs
            | Self::NodePorts => Some(ValidationTarget::Cluster),
            _ => None,
        }
    }
}

/// Choices offered by the select-style fields, captured when the dialog opens.
#[derive(Debug, Clone, Default)]
pub struct DraftOptions {
    pub targets: Vec<String>,
    pub cluster_defaults: BTreeMap<String, ClusterQuota>,
    pub secret_paths: Vec<String>,
    pub builtin_templates: Vec<String>,
}

impl DraftOptions {
    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self {
            targets: catalog.deploy_targets(),
            cluster_defaults: catalog.cluster_defaults.clone(),
            secret_paths: catalog
                .tenants
                .iter()
                .map(|tenant| tenant.secret_path.clone())
                .collect(),
            builtin_templates: catalog.builtin_templates.clone(),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct DeploymentPayload {
    pub tenant_name: String,
    pub app_code: String,
    pub namespace: String,
    pub description: String,
    pub repositories: Vec<RepositoryEntry>,
    pub template: TemplateSource,
    pub ingress: Vec<IngressRule>,
    pub target: Option<String>,
    pub quota: ClusterQuota,
    pub vault_secret_path: Option<String>,
    pub auto_sync: bool,
}

/// Uncommitted deploy form. Lives from dialog open until submit or cancel.
#[derive(Debug, Clone)]
pub struct DeployDraft {
    options: DraftOptions,
    tenant_name: String,
    app_code: String,
    namespace: String,
    description: String,
    repositories: Vec<RepositoryEntry>,
    template: TemplateSource,
    ingress: Vec<IngressRule>,
    target: Option<String>,
    quota: ClusterQuota,
    use_vault: bool,
    secret_path: String,
    auto_sync: bool,
    validation: BTreeMap<ValidationTarget, ValidationStatus>,
    in_flight: BTreeSet<ValidationTicket>,
    next_serial: u64,
}

impl DeployDraft {
    pub fn new(options: DraftOptions) -> Self {
        Self {
            options,
            tenant_name: String::new(),
            app_code: String::new(),
            namespace: String::new(),
            description: String::new(),
            repositories: vec![RepositoryEntry::default()],
            template: TemplateSource::default(),
            ingress: Vec::new(),
            target: None,
            quota: ClusterQuota::default(),
            use_vault: false,
            secret_path: String::new(),
            auto_sync: false,
            validation: BTreeMap::new(),
            in_flight: BTreeSet::new(),
            next_serial: 0,
        }
    }

    pub fn repositories(&self) -> &[RepositoryEntry] {
        &self.repositories
    }

    pub fn ingress(&self) -> &[IngressRule] {
        &self.ingress
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn quota(&self) -> &ClusterQuota {
        &self.quota
    }

    pub fn use_vault(&self) -> bool {
        self.use_vault
    }

    /// Appends an empty repository entry. No-op once the cap is reached.
    pub fn add_repository(&mut self) -> bool {
        if self.repositories.len() >= MAX_LIST_ENTRIES {
            return false;
        }
        self.repositories.push(RepositoryEntry::default());
        true
    }

    /// The first repository entry is never removed.
    pub fn remove_repository(&mut self, index: usize) -> bool {
        if self.repositories.len() <= 1 || index >= self.repositories.len() {
            return false;
        }
        self.repositories.remove(index);

        // Outcomes still in flight carry the old index, so checks on moved
        // entries are retired and their rows go back to idle.
        self.in_flight.retain(|ticket| {
            !matches!(ticket.target, ValidationTarget::Repository(i) if i >= index)
        });
        let shifted = std::mem::take(&mut self.validation)
            .into_iter()
            .filter_map(|(target, status)| match target {
                ValidationTarget::Repository(i) if i == index => None,
                ValidationTarget::Repository(i) if i > index && status == ValidationStatus::Loading => {
                    None
                }
                ValidationTarget::Repository(i) if i > index => {
                    Some((ValidationTarget::Repository(i - 1), status))
                }
                other => Some((other, status)),
            })
            .collect();
        self.validation = shifted;
        true
    }

    /// Appends an empty ingress rule. No-op once the cap is reached.
    pub fn add_ingress(&mut self) -> bool {
        if self.ingress.len() >= MAX_LIST_ENTRIES {
            return false;
        }
        self.ingress.push(IngressRule::default());
        true
    }

    pub fn remove_ingress(&mut self, index: usize) -> bool {
        if index >= self.ingress.len() {
            return false;
        }
        self.ingress.remove(index);
        true
    }

    pub fn fields(&self) -> Vec<DraftField> {
        let mut fields = vec![
            DraftField::TenantName,
            DraftField::AppCode,
            DraftField::Namespace,
            DraftField::Description,
        ];
        for index in 0..self.repositories.len() {
            fields.push(DraftField::RepositoryUrl(index));
            fields.push(DraftField::RepositoryBranch(index));
        }
        fields.push(DraftField::TemplateKind);
        fields.push(DraftField::TemplateValue);
        if self.template.kind == TemplateKind::External {
            fields.push(DraftField::InstanceName);
            fields.push(DraftField::TargetRevision);
        }
        for index in 0..self.ingress.len() {
            fields.push(DraftField::IngressName(index));
            fields.push(DraftField::IngressService(index));
            fields.push(DraftField::IngressPort(index));
        }
        fields.extend([
            DraftField::Target,
            DraftField::Cpu,
            DraftField::Memory,
            DraftField::Storage,
            DraftField::Pvcs,
            DraftField::NodePorts,
            DraftField::UseVault,
        ]);
        if self.use_vault {
            fields.push(DraftField::SecretPath);
        }
        fields.push(DraftField::AutoSync);
        fields
    }

    pub fn input_kind(&self, field: DraftField) -> FieldInput {
        match field {
            DraftField::TemplateKind | DraftField::Target | DraftField::SecretPath => {
                FieldInput::Choice
            }
            DraftField::TemplateValue if self.template.kind == TemplateKind::Builtin => {
                FieldInput::Choice
            }
            DraftField::UseVault | DraftField::AutoSync => FieldInput::Toggle,
            _ => FieldInput::Text,
        }
    }

    pub fn value(&self, field: DraftField) -> String {
        match field {
            DraftField::TemplateKind => self.template.kind.label().to_string(),
            DraftField::Target => self.target.clone().unwrap_or_default(),
            DraftField::UseVault => yes_no(self.use_vault).to_string(),
            DraftField::AutoSync => yes_no(self.auto_sync).to_string(),
            _ => self.text(field).cloned().unwrap_or_default(),
        }
    }

    fn text(&self, field: DraftField) -> Option<&String> {
        match field {
            DraftField::TenantName => Some(&self.tenant_name),
            DraftField::AppCode => Some(&self.app_code),
            DraftField::Namespace => Some(&self.namespace),
            DraftField::Description => Some(&self.description),
            DraftField::RepositoryUrl(index) => self.repositories.get(index).map(|r| &r.url),
            DraftField::RepositoryBranch(index) => {
                self.repositories.get(index).map(|r| &r.branch)
            }
            DraftField::TemplateValue => Some(&self.template.value),
            DraftField::InstanceName => Some(&self.template.instance_name),
            DraftField::TargetRevision => Some(&self.template.target_revision),
            DraftField::IngressName(index) => self.ingress.get(index).map(|r| &r.name),
            DraftField::IngressService(index) => self.ingress.get(index).map(|r| &r.service),
            DraftField::IngressPort(index) => self.ingress.get(index).map(|r| &r.port),
            DraftField::Cpu => Some(&self.quota.cpu),
            DraftField::Memory => Some(&self.quota.memory),
            DraftField::Storage => Some(&self.quota.storage),
            DraftField::Pvcs => Some(&self.quota.pvcs),
            DraftField::NodePorts => Some(&self.quota.nodeports),
            DraftField::SecretPath => Some(&self.secret_path),
            DraftField::TemplateKind
            | DraftField::Target
            | DraftField::UseVault
            | DraftField::AutoSync => None,
        }
    }

    fn text_mut(&mut self, field: DraftField) -> Option<&mut String> {
        match field {
            DraftField::TenantName => Some(&mut self.tenant_name),
            DraftField::AppCode => Some(&mut self.app_code),
            DraftField::Namespace => Some(&mut self.namespace),
            DraftField::Description => Some(&mut self.description),
            DraftField::RepositoryUrl(index) => {
                self.repositories.get_mut(index).map(|r| &mut r.url)
            }
            DraftField::RepositoryBranch(index) => {
                self.repositories.get_mut(index).map(|r| &mut r.branch)
            }
            DraftField::TemplateValue => Some(&mut self.template.value),
            DraftField::InstanceName => Some(&mut self.template.instance_name),
            DraftField::TargetRevision => Some(&mut self.template.target_revision),
            DraftField::IngressName(index) => self.ingress.get_mut(index).map(|r| &mut r.name),
            DraftField::IngressService(index) => {
                self.ingress.get_mut(index).map(|r| &mut r.service)
            }
            DraftField::IngressPort(index) => self.ingress.get_mut(index).map(|r| &mut r.port),
            DraftField::Cpu => Some(&mut self.quota.cpu),
            DraftField::Memory => Some(&mut self.quota.memory),
            DraftField::Storage => Some(&mut self.quota.storage),
            DraftField::Pvcs => Some(&mut self.quota.pvcs),
            DraftField::NodePorts => Some(&mut self.quota.nodeports),
            DraftField::SecretPath => Some(&mut self.secret_path),
            DraftField::TemplateKind
            | DraftField::Target
            | DraftField::UseVault
            | DraftField::AutoSync => None,
        }
    }

    pub fn set_text(&mut self, field: DraftField, value: impl Into<String>) -> bool {
        if self.input_kind(field) != FieldInput::Text {
            return false;
        }
        let Some(text) = self.text_mut(field) else {
            return false;
        };
        *text = value.into();
        self.on_field_edited(field);
        true
    }

    pub fn push_char(&mut self, field: DraftField, c: char) -> bool {
        if self.input_kind(field) != FieldInput::Text {
            return false;
        }
        let Some(text) = self.text_mut(field) else {
            return false;
        };
        text.push(c);
        self.on_field_edited(field);
        true
    }

    pub fn pop_char(&mut self, field: DraftField) -> bool {
        if self.input_kind(field) != FieldInput::Text {
            return false;
        }
        let Some(text) = self.text_mut(field) else {
            return false;
        };
        if text.pop().is_none() {
            return false;
        }
        self.on_field_edited(field);
        true
    }

    /// Editing the identifier a validation ran against invalidates the result.
    fn on_field_edited(&mut self, field: DraftField) {
        let target = match field {
            DraftField::RepositoryUrl(index) => Some(ValidationTarget::Repository(index)),
            DraftField::TemplateValue => Some(ValidationTarget::Template),
            _ => None,
        };
        if let Some(target) = target {
            self.reset_validation(target);
        }
    }

    fn reset_validation(&mut self, target: ValidationTarget) {
        self.validation.remove(&target);
        self.in_flight.retain(|ticket| ticket.target != target);
    }

    pub fn toggle(&mut self, field: DraftField) -> bool {
        match field {
            DraftField::UseVault => {
                self.use_vault = !self.use_vault;
                if self.use_vault && self.secret_path.is_empty() {
                    self.secret_path = self.options.secret_paths.first().cloned().unwrap_or_default();
                }
                true
            }
            DraftField::AutoSync => {
                self.auto_sync = !self.auto_sync;
                true
            }
            _ => false,
        }
    }

    /// Steps a select-style field through its options.
    pub fn cycle(&mut self, field: DraftField, delta: isize) -> bool {
        match field {
            DraftField::TemplateKind => {
                self.template.kind = match self.template.kind {
                    TemplateKind::Builtin => TemplateKind::External,
                    TemplateKind::External => TemplateKind::Builtin,
                };
                self.template.value.clear();
                self.reset_validation(ValidationTarget::Template);
                true
            }
            DraftField::TemplateValue if self.template.kind == TemplateKind::Builtin => {
                let next = step_option(
                    &self.options.builtin_templates,
                    Some(self.template.value.as_str()).filter(|value| !value.is_empty()),
                    delta,
                );
                let Some(next) = next else {
                    return false;
                };
                self.template.value = next;
                self.reset_validation(ValidationTarget::Template);
                true
            }
            DraftField::Target => {
                let next = step_option(&self.options.targets, self.target.as_deref(), delta);
                match next {
                    Some(next) => self.select_target(&next),
                    None => false,
                }
            }
            DraftField::SecretPath => {
                let next = step_option(
                    &self.options.secret_paths,
                    Some(self.secret_path.as_str()).filter(|value| !value.is_empty()),
                    delta,
                );
                let Some(next) = next else {
                    return false;
                };
                self.secret_path = next;
                true
            }
            _ => false,
        }
    }

    /// Selects a deploy target and prefills its quota defaults.
    pub fn select_target(&mut self, target: &str) -> bool {
        let Some(defaults) = self.options.cluster_defaults.get(target) else {
            return false;
        };
        self.quota = defaults.clone();
        self.target = Some(target.to_string());
        self.reset_validation(ValidationTarget::Cluster);
        true
    }

    /// Share of the counted required fields that are filled in, rounded down.
    pub fn completion_percent(&self) -> u8 {
        let first_repository = self.repositories.first();
        let counted = [
            self.tenant_name.as_str(),
            self.app_code.as_str(),
            self.namespace.as_str(),
            self.description.as_str(),
            first_repository.map(|r| r.url.as_str()).unwrap_or(""),
            first_repository.map(|r| r.branch.as_str()).unwrap_or(""),
            self.template.value.as_str(),
            self.target.as_deref().unwrap_or(""),
            self.quota.cpu.as_str(),
            self.quota.memory.as_str(),
        ];
        let filled = counted
            .iter()
            .filter(|value| !value.trim().is_empty())
            .count();
        (filled * 100 / COUNTED_FIELDS) as u8
    }

    pub fn validation_status(&self, target: ValidationTarget) -> &ValidationStatus {
        const IDLE: &ValidationStatus = &ValidationStatus::Idle;
        self.validation.get(&target).unwrap_or(IDLE)
    }

    pub fn is_validating(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Marks `target` as loading and builds the request for the verifier.
    /// Returns `None` when there is nothing to validate yet.
    pub fn begin_validation(
        &mut self,
        target: ValidationTarget,
    ) -> Option<(ValidationTicket, VerificationRequest)> {
        let (kind, identifier) = match target {
            ValidationTarget::Repository(index) => (
                VerificationKind::Repository,
                self.repositories.get(index)?.url.trim().to_string(),
            ),
            ValidationTarget::Template => (
                match self.template.kind {
                    TemplateKind::Builtin => VerificationKind::BuiltinTemplate,
                    TemplateKind::External => VerificationKind::ExternalTemplate,
                },
                self.template.value.trim().to_string(),
            ),
            ValidationTarget::Cluster => (
                VerificationKind::Cluster,
                self.target.clone().unwrap_or_default(),
            ),
        };
        if identifier.is_empty() {
            return None;
        }

        let ticket = ValidationTicket {
            target,
            serial: self.next_serial,
        };
        self.next_serial += 1;
        self.in_flight.insert(ticket);
        self.validation.insert(target, ValidationStatus::Loading);
        Some((ticket, VerificationRequest { kind, identifier }))
    }

    /// Records a verifier outcome. Among live tickets the last arrival wins;
    /// retired tickets are ignored.
    pub fn finish_validation(
        &mut self,
        ticket: ValidationTicket,
        response: VerificationResponse,
    ) -> bool {
        if !self.in_flight.remove(&ticket) {
            return false;
        }

        let target = ticket.target;
        let status = if response.ok {
            ValidationStatus::Passed(response.message)
        } else {
            ValidationStatus::Failed(response.message)
        };
        self.validation.insert(target, status);
        true
    }

    pub fn submit(&self) -> DeploymentPayload {
        DeploymentPayload {
            tenant_name: self.tenant_name.trim().to_string(),
            app_code: self.app_code.trim().to_string(),
            namespace: self.namespace.trim().to_string(),
            description: self.description.trim().to_string(),
            repositories: self
                .repositories
                .iter()
                .filter(|repository| !repository.url.trim().is_empty())
                .cloned()
                .collect(),
            template: self.template.clone(),
            ingress: self
                .ingress
                .iter()
                .filter(|rule| !rule.name.trim().is_empty())
                .cloned()
                .collect(),
            target: self.target.clone(),
            quota: self.quota.clone(),
            vault_secret_path: self
                .use_vault
                .then(|| self.secret_path.clone())
                .filter(|path| !path.is_empty()),
            auto_sync: self.auto_sync,
        }
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn step_option(options: &[String], current: Option<&str>, delta: isize) -> Option<String> {
    if options.is_empty() {
        return None;
    }
    let len = options.len() as isize;
    let next = match current.and_then(|value| options.iter().position(|option| option == value)) {
        Some(index) => (index as isize + delta).rem_euclid(len),
        None if delta < 0 => len - 1,
        None => 0,
    };
    options.get(next as usize).cloned()
}

#[cfg(test)]
mod tests {
    use super::{
        DeployDraft, DraftField, DraftOptions, FieldInput, MAX_LIST_ENTRIES, TemplateKind,
        ValidationStatus, ValidationTarget,
    };
    use crate::catalog::Catalog;
    use crate::verify::{VerificationKind, VerificationResponse};

    fn draft() -> DeployDraft {
        DeployDraft::new(DraftOptions::from_catalog(&Catalog::fixtures()))
    }

    fn fill_counted_fields(draft: &mut DeployDraft) {
        assert!(draft.set_text(DraftField::TenantName, "tenant-a"));
        assert!(draft.set_text(DraftField::AppCode, "APP01"));
        assert!(draft.set_text(DraftField::Namespace, "payments"));
        assert!(draft.set_text(DraftField::Description, "payment gateway"));
        assert!(draft.set_text(
            DraftField::RepositoryUrl(0),
            "https://github.com/org/payments"
        ));
        assert!(draft.set_text(DraftField::RepositoryBranch(0), "main"));
        assert!(draft.cycle(DraftField::TemplateValue, 1));
        assert!(draft.select_target("UAT"));
    }

    #[test]
    fn new_draft_is_zero_percent_complete() {
        assert_eq!(draft().completion_percent(), 0);
    }

    #[test]
    fn fully_populated_draft_is_complete() {
        let mut draft = draft();
        fill_counted_fields(&mut draft);
        assert_eq!(draft.completion_percent(), 100);
    }

    #[test]
    fn progress_counts_only_non_blank_fields() {
        let mut draft = draft();
        draft.set_text(DraftField::TenantName, "tenant-a");
        draft.set_text(DraftField::AppCode, "   ");
        assert_eq!(draft.completion_percent(), 10);
        draft.select_target("SIT");
        assert_eq!(draft.completion_percent(), 40);
    }

    #[test]
    fn repeatable_sections_stop_at_cap() {
        let mut draft = draft();
        assert!(draft.add_repository());
        assert!(!draft.add_repository());
        assert_eq!(draft.repositories().len(), MAX_LIST_ENTRIES);

        assert!(draft.add_ingress());
        assert!(draft.add_ingress());
        assert!(!draft.add_ingress());
        assert_eq!(draft.ingress().len(), MAX_LIST_ENTRIES);
    }

    #[test]
    fn first_repository_cannot_be_removed() {
        let mut draft = draft();
        assert!(!draft.remove_repository(0));
        draft.add_repository();
        assert!(draft.remove_repository(0));
        assert_eq!(draft.repositories().len(), 1);
    }

    #[test]
    fn removing_a_repository_shifts_its_validation_state() {
        let mut draft = draft();
        draft.add_repository();
        draft.set_text(DraftField::RepositoryUrl(1), "https://github.com/org/second");
        let (ticket, _) = draft
            .begin_validation(ValidationTarget::Repository(1))
            .expect("request");
        assert!(draft.finish_validation(ticket, VerificationResponse::passed("ok")));

        assert!(draft.remove_repository(0));
        assert_eq!(
            draft.validation_status(ValidationTarget::Repository(0)),
            &ValidationStatus::Passed("ok".to_string())
        );
    }

    #[test]
    fn removing_a_repository_retires_checks_still_running() {
        let mut draft = draft();
        draft.add_repository();
        draft.set_text(DraftField::RepositoryUrl(1), "https://github.com/org/second");
        let (ticket, _) = draft
            .begin_validation(ValidationTarget::Repository(1))
            .expect("request");

        assert!(draft.remove_repository(0));
        assert_eq!(
            draft.validation_status(ValidationTarget::Repository(0)),
            &ValidationStatus::Idle
        );
        assert!(!draft.is_validating());

        assert!(!draft.finish_validation(ticket, VerificationResponse::passed("ok")));
        assert_eq!(
            draft.validation_status(ValidationTarget::Repository(0)),
            &ValidationStatus::Idle
        );
    }

    #[test]
    fn removing_a_later_repository_keeps_earlier_checks_running() {
        let mut draft = draft();
        draft.set_text(DraftField::RepositoryUrl(0), "https://github.com/org/first");
        draft.add_repository();
        let (ticket, _) = draft
            .begin_validation(ValidationTarget::Repository(0))
            .expect("request");

        assert!(draft.remove_repository(1));
        assert!(draft.is_validating());
        assert!(draft.finish_validation(ticket, VerificationResponse::passed("ok")));
        assert_eq!(
            draft.validation_status(ValidationTarget::Repository(0)),
            &ValidationStatus::Passed("ok".to_string())
        );
    }

    #[test]
    fn target_selection_prefills_quota() {
        let mut draft = draft();
        assert!(draft.select_target("PRD"));
        assert_eq!(draft.quota().cpu, "8");
        assert_eq!(draft.quota().nodeports, "5");
        assert!(!draft.select_target("MOON"));
        assert_eq!(draft.target(), Some("PRD"));
    }

    #[test]
    fn empty_identifiers_do_not_start_validation() {
        let mut draft = draft();
        assert_eq!(draft.begin_validation(ValidationTarget::Repository(0)), None);
        assert_eq!(draft.begin_validation(ValidationTarget::Cluster), None);
        assert!(!draft.is_validating());
    }

    #[test]
    fn later_validation_outcome_wins() {
        let mut draft = draft();
        draft.set_text(DraftField::RepositoryUrl(0), "https://github.com/org/app");
        let target = ValidationTarget::Repository(0);
        let (first, request) = draft.begin_validation(target).expect("request");
        assert_eq!(request.kind, VerificationKind::Repository);
        assert!(draft.is_validating());

        let (second, _) = draft.begin_validation(target).expect("request");
        assert!(draft.finish_validation(second, VerificationResponse::passed("second")));
        assert!(draft.is_validating());
        assert!(draft.finish_validation(first, VerificationResponse::failed("first")));
        assert_eq!(
            draft.validation_status(target),
            &ValidationStatus::Failed("first".to_string())
        );

        let (third, _) = draft.begin_validation(target).expect("request");
        assert!(draft.finish_validation(third, VerificationResponse::passed("third")));
        assert_eq!(
            draft.validation_status(target),
            &ValidationStatus::Passed("third".to_string())
        );
        assert!(!draft.is_validating());
    }

    #[test]
    fn editing_repository_url_resets_its_validation() {
        let mut draft = draft();
        draft.set_text(DraftField::RepositoryUrl(0), "https://github.com/org/app");
        let (ticket, _) = draft
            .begin_validation(ValidationTarget::Repository(0))
            .expect("request");
        assert!(draft.finish_validation(ticket, VerificationResponse::passed("ok")));
        draft.push_char(DraftField::RepositoryUrl(0), 's');
        assert_eq!(
            draft.validation_status(ValidationTarget::Repository(0)),
            &ValidationStatus::Idle
        );
    }

    #[test]
    fn editing_repository_url_ignores_the_pending_outcome() {
        let mut draft = draft();
        draft.set_text(DraftField::RepositoryUrl(0), "https://github.com/org/app");
        let (ticket, _) = draft
            .begin_validation(ValidationTarget::Repository(0))
            .expect("request");
        draft.pop_char(DraftField::RepositoryUrl(0));

        assert!(!draft.is_validating());
        assert!(!draft.finish_validation(ticket, VerificationResponse::passed("ok")));
        assert_eq!(
            draft.validation_status(ValidationTarget::Repository(0)),
            &ValidationStatus::Idle
        );
    }

    #[test]
    fn conditional_fields_follow_toggles() {
        let mut draft = draft();
        assert!(!draft.fields().contains(&DraftField::SecretPath));
        assert!(draft.toggle(DraftField::UseVault));
        assert!(draft.fields().contains(&DraftField::SecretPath));
        assert_eq!(draft.value(DraftField::SecretPath), "secrets/data/tenant-a");

        assert_eq!(draft.input_kind(DraftField::TemplateValue), FieldInput::Choice);
        draft.cycle(DraftField::TemplateKind, 1);
        assert!(draft.fields().contains(&DraftField::InstanceName));
        assert_eq!(draft.input_kind(DraftField::TemplateValue), FieldInput::Text);
    }

    #[test]
    fn payload_serializes_the_draft() {
        let mut draft = draft();
        fill_counted_fields(&mut draft);
        draft.add_ingress();
        draft.set_text(DraftField::IngressName(0), "web");
        draft.set_text(DraftField::IngressService(0), "payments-svc");
        draft.set_text(DraftField::IngressPort(0), "8080");
        draft.add_repository();
        draft.toggle(DraftField::AutoSync);

        let payload = draft.submit();
        assert_eq!(payload.repositories.len(), 1);
        assert_eq!(payload.ingress.len(), 1);
        assert_eq!(payload.template.kind, TemplateKind::Builtin);
        assert_eq!(payload.vault_secret_path, None);

        let json = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(json["target"], "UAT");
        assert_eq!(json["template"]["kind"], "builtin");
        assert_eq!(json["quota"]["memory"], "8");
        assert_eq!(json["auto_sync"], true);
        assert!(json["template"].get("instance_name").is_none());
    }
}
