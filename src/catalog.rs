use crate::model::{
    Application, BillingLine, ClusterQuota, EventKind, Kustomization, KustomizationEvent,
    KustomizationSource, Node, NodeStatus, ResourceCounts, ResourceQuota, Secret, SourceKind,
    Tenant, VirtualService, Workflow, WorkflowPhase, WorkflowTemplate,
};
use std::collections::BTreeMap;

pub const DEPLOY_TARGETS: [&str; 4] = ["SIT", "SIT1", "UAT", "PRD"];

/// In-memory data set behind every panel. Rebuilt on start, never written back.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub applications: Vec<Application>,
    pub kustomizations: Vec<Kustomization>,
    pub workflows: Vec<Workflow>,
    pub workflow_templates: Vec<WorkflowTemplate>,
    pub secrets: Vec<Secret>,
    pub nodes: Vec<Node>,
    pub virtual_services: Vec<VirtualService>,
    pub resource_quota: ResourceQuota,
    pub cluster_defaults: BTreeMap<String, ClusterQuota>,
    pub tenants: Vec<Tenant>,
    pub builtin_templates: Vec<String>,
    pub billing: Vec<BillingLine>,
}

impl Catalog {
    pub fn fixtures() -> Self {
        Self {
            applications: applications(),
            kustomizations: kustomizations(),
            workflows: workflows(),
            workflow_templates: workflow_templates(),
            secrets: secrets(),
            nodes: nodes(),
            virtual_services: virtual_services(),
            resource_quota: ResourceQuota {
                cpu: "10 cores".to_string(),
                memory: "32Gi".to_string(),
                storage: "500Gi".to_string(),
            },
            cluster_defaults: cluster_defaults(),
            tenants: tenants(),
            builtin_templates: vec![
                "web-service".to_string(),
                "worker".to_string(),
                "cron-job".to_string(),
                "stateful-service".to_string(),
            ],
            billing: vec![
                BillingLine {
                    name: "Compute",
                    amount: 450.00,
                },
                BillingLine {
                    name: "Storage",
                    amount: 200.00,
                },
                BillingLine {
                    name: "Network",
                    amount: 150.00,
                },
                BillingLine {
                    name: "Security",
                    amount: 100.00,
                },
            ],
        }
    }

    pub fn cluster_quota(&self, target: &str) -> Option<&ClusterQuota> {
        self.cluster_defaults.get(target)
    }

    /// Known deploy targets in display order: the fixed ones first, then any
    /// extra targets contributed by config.
    pub fn deploy_targets(&self) -> Vec<String> {
        let mut targets = DEPLOY_TARGETS
            .iter()
            .filter(|target| self.cluster_defaults.contains_key(**target))
            .map(|target| target.to_string())
            .collect::<Vec<_>>();
        for name in self.cluster_defaults.keys() {
            if !targets.contains(name) {
                targets.push(name.clone());
            }
        }
        targets
    }

    pub fn merge_cluster_overrides(&mut self, overrides: &BTreeMap<String, ClusterQuota>) {
        for (name, quota) in overrides {
            self.cluster_defaults.insert(name.clone(), quota.clone());
        }
    }
}

fn applications() -> Vec<Application> {
    let rows = [
        (
            1,
            "external secret",
            "2023-04-01",
            "John Doe",
            "Alice Smith",
            "Bob Johnson",
            "abc123",
            "Updated dependencies",
            3,
            "2 cores",
            "4Gi",
            2,
        ),
        (
            2,
            "argo-rollout",
            "2023-04-02",
            "Jane Smith",
            "Charlie Wilson",
            "Alice Brown",
            "def456",
            "Added new feature",
            5,
            "4 cores",
            "8Gi",
            3,
        ),
        (
            3,
            "kube-dashboard",
            "2023-04-03",
            "Bob Johnson",
            "John Doe",
            "Charlie Wilson",
            "ghi789",
            "Fixed bug",
            2,
            "1 core",
            "2Gi",
            1,
        ),
        (
            4,
            "ray",
            "2023-04-04",
            "Alice Brown",
            "Jane Smith",
            "Bob Johnson",
            "jkl012",
            "Refactored code",
            4,
            "2 cores",
            "4Gi",
            2,
        ),
        (
            5,
            "tidb",
            "2023-04-05",
            "Charlie Wilson",
            "Alice Smith",
            "John Doe",
            "mno345",
            "Improved performance",
            6,
            "3 cores",
            "6Gi",
            4,
        ),
    ];

    rows.into_iter()
        .map(
            |(
                id,
                name,
                last_update,
                owner,
                creator,
                last_updater,
                commit_id,
                commit_log,
                pods,
                cpu,
                memory,
                secrets,
            )| Application {
                id,
                name: name.to_string(),
                uri: format!("/apps/{name}"),
                last_update: last_update.to_string(),
                owner: owner.to_string(),
                creator: creator.to_string(),
                last_updater: last_updater.to_string(),
                last_commit_id: commit_id.to_string(),
                last_commit_log: commit_log.to_string(),
                pod_count: pods,
                cpu: cpu.to_string(),
                memory: memory.to_string(),
                secret_count: secrets,
            },
        )
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn kustomization(
    id: u32,
    name: &str,
    path: &str,
    validated: bool,
    owner: &str,
    environments: &[&str],
    last_applied: &str,
    source_url: &str,
    branch: &str,
    resources: (u32, u32, u32, u32),
    event: (EventKind, &str, &str),
) -> Kustomization {
    let (deployments, services, configmaps, secrets) = resources;
    let (kind, reason, message) = event;
    Kustomization {
        id,
        name: name.to_string(),
        path: path.to_string(),
        validated,
        owner: owner.to_string(),
        environments: environments.iter().map(|env| env.to_string()).collect(),
        last_applied: last_applied.to_string(),
        source: KustomizationSource {
            kind: SourceKind::Git,
            url: source_url.to_string(),
            branch: Some(branch.to_string()),
            tag: None,
        },
        resources: ResourceCounts {
            deployments,
            services,
            configmaps,
            secrets,
        },
        events: vec![KustomizationEvent {
            time: last_applied.to_string(),
            kind,
            reason: reason.to_string(),
            message: message.to_string(),
        }],
    }
}

fn kustomizations() -> Vec<Kustomization> {
    vec![
        kustomization(
            1,
            "argocd",
            "./overlays/production",
            true,
            "DevOps Team",
            &["SIT", "UAT", "PRD"],
            "2024-03-15T10:30:00Z",
            "https://github.com/org/argocd",
            "main",
            (3, 2, 4, 2),
            (
                EventKind::Normal,
                "Applied",
                "Successfully updated argocd configuration",
            ),
        ),
        kustomization(
            2,
            "argo-workflows",
            "./overlays/staging",
            true,
            "Platform Team",
            &["SIT", "UAT"],
            "2024-03-15T09:45:00Z",
            "https://github.com/org/argo-workflows",
            "develop",
            (2, 1, 3, 1),
            (
                EventKind::Normal,
                "Validation",
                "Added workflow overlay successfully",
            ),
        ),
        kustomization(
            3,
            "fluent-operator",
            "./base",
            true,
            "Logging Team",
            &["SIT1", "UAT"],
            "2024-03-15T08:15:00Z",
            "https://github.com/org/fluent-operator",
            "main",
            (1, 1, 2, 1),
            (EventKind::Normal, "Updated", "Updated output configuration"),
        ),
        kustomization(
            4,
            "vault",
            "./overlays/vault",
            true,
            "Security Team",
            &["SIT", "SIT1", "UAT", "PRD"],
            "2024-03-15T07:30:00Z",
            "https://github.com/org/vault-config",
            "main",
            (3, 2, 5, 4),
            (
                EventKind::Normal,
                "Validation",
                "Security configuration validated",
            ),
        ),
        kustomization(
            5,
            "loki",
            "./overlays/monitoring",
            true,
            "Monitoring Team",
            &["SIT", "UAT", "PRD"],
            "2024-03-14T15:30:00Z",
            "https://github.com/org/loki-config",
            "main",
            (2, 2, 3, 1),
            (EventKind::Normal, "Added", "Added Loki configuration"),
        ),
        kustomization(
            6,
            "eck-operator",
            "./overlays/elastic",
            false,
            "Platform Team",
            &["SIT", "UAT"],
            "2024-03-14T14:20:00Z",
            "https://github.com/org/eck-operator",
            "main",
            (1, 1, 2, 2),
            (
                EventKind::Warning,
                "Updating",
                "Removing ES and Kibana components",
            ),
        ),
    ]
}

fn workflows() -> Vec<Workflow> {
    let rows = [
        (
            1,
            "data-processing",
            WorkflowPhase::Succeeded,
            Some("2023-06-01T10:00:00Z"),
            Some("2023-06-01T10:15:00Z"),
            "15m",
            "100%",
            "Data processing completed successfully",
        ),
        (
            2,
            "ml-training",
            WorkflowPhase::Running,
            Some("2023-06-02T09:30:00Z"),
            None,
            "1h 30m",
            "60%",
            "Training model on batch 3 of 5",
        ),
        (
            3,
            "etl-pipeline",
            WorkflowPhase::Failed,
            Some("2023-06-03T08:00:00Z"),
            Some("2023-06-03T08:05:00Z"),
            "5m",
            "20%",
            "Error in data extraction step",
        ),
        (
            4,
            "data-backup",
            WorkflowPhase::Pending,
            None,
            None,
            "-",
            "0%",
            "Waiting for resources",
        ),
        (
            5,
            "report-generation",
            WorkflowPhase::Running,
            Some("2023-06-04T11:00:00Z"),
            None,
            "45m",
            "80%",
            "Generating final report",
        ),
    ];

    rows.into_iter()
        .map(
            |(id, name, phase, started, finished, duration, progress, message)| Workflow {
                id,
                name: name.to_string(),
                phase,
                started_at: started.map(str::to_string),
                finished_at: finished.map(str::to_string),
                duration: duration.to_string(),
                progress: progress.to_string(),
                message: message.to_string(),
            },
        )
        .collect()
}

fn workflow_templates() -> Vec<WorkflowTemplate> {
    [
        (
            1,
            "Data Processing",
            "Template for data processing workflows",
            "2023-05-01",
        ),
        (
            2,
            "ML Training",
            "Machine learning model training template",
            "2023-05-02",
        ),
        (
            3,
            "ETL Pipeline",
            "Extract, Transform, Load pipeline template",
            "2023-05-03",
        ),
    ]
    .into_iter()
    .map(|(id, name, description, created_at)| WorkflowTemplate {
        id,
        name: name.to_string(),
        description: description.to_string(),
        created_at: created_at.to_string(),
    })
    .collect()
}

fn secrets() -> Vec<Secret> {
    [
        (1, "database-credentials", "Opaque", "2023-06-01", "2023-06-05"),
        (2, "api-keys", "Opaque", "2023-06-02", "2023-06-02"),
        (3, "tls-cert", "kubernetes.io/tls", "2023-06-03", "2023-06-04"),
        (
            4,
            "docker-registry",
            "kubernetes.io/dockerconfigjson",
            "2023-06-04",
            "2023-06-04",
        ),
        (
            5,
            "service-account-token",
            "kubernetes.io/service-account-token",
            "2023-06-05",
            "2023-06-05",
        ),
    ]
    .into_iter()
    .map(|(id, name, kind, created_at, last_updated)| Secret {
        id,
        name: name.to_string(),
        kind: kind.to_string(),
        created_at: created_at.to_string(),
        last_updated: last_updated.to_string(),
    })
    .collect()
}

fn nodes() -> Vec<Node> {
    [
        (1, "node-1", "192.168.1.1", NodeStatus::Ready, "4 cores", "16Gi"),
        (2, "node-2", "192.168.1.2", NodeStatus::Ready, "4 cores", "16Gi"),
        (3, "node-3", "192.168.1.3", NodeStatus::NotReady, "2 cores", "8Gi"),
    ]
    .into_iter()
    .map(|(id, name, ip, status, cpu, memory)| Node {
        id,
        name: name.to_string(),
        ip: ip.to_string(),
        status,
        cpu: cpu.to_string(),
        memory: memory.to_string(),
    })
    .collect()
}

fn virtual_services() -> Vec<VirtualService> {
    [
        (
            1,
            "argocd-server",
            &["argocd.h4.internal"][..],
            &["istio-system/public-gateway"][..],
            "2023-07-01",
        ),
        (
            2,
            "vault-ui",
            &["vault.h4.internal"][..],
            &["istio-system/internal-gateway"][..],
            "2023-07-02",
        ),
        (
            3,
            "grafana",
            &["grafana.h4.internal", "metrics.h4.internal"][..],
            &["istio-system/internal-gateway"][..],
            "2023-07-05",
        ),
    ]
    .into_iter()
    .map(|(id, name, hosts, gateways, created_at)| VirtualService {
        id,
        name: name.to_string(),
        hosts: hosts.iter().map(|host| host.to_string()).collect(),
        gateways: gateways.iter().map(|gateway| gateway.to_string()).collect(),
        created_at: created_at.to_string(),
    })
    .collect()
}

fn cluster_defaults() -> BTreeMap<String, ClusterQuota> {
    [
        ("SIT", "2", "4", "20", "3", "2"),
        ("SIT1", "2", "4", "20", "3", "2"),
        ("UAT", "4", "8", "50", "5", "3"),
        ("PRD", "8", "16", "100", "10", "5"),
    ]
    .into_iter()
    .map(|(name, cpu, memory, storage, pvcs, nodeports)| {
        (
            name.to_string(),
            ClusterQuota {
                cpu: cpu.to_string(),
                memory: memory.to_string(),
                storage: storage.to_string(),
                pvcs: pvcs.to_string(),
                nodeports: nodeports.to_string(),
            },
        )
    })
    .collect()
}

fn tenants() -> Vec<Tenant> {
    [
        ("1", "Tenant A", "secrets/data/tenant-a"),
        ("2", "Tenant B", "secrets/data/tenant-b"),
        ("3", "Tenant C", "secrets/data/tenant-c"),
    ]
    .into_iter()
    .map(|(id, name, secret_path)| Tenant {
        id: id.to_string(),
        name: name.to_string(),
        secret_path: secret_path.to_string(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::Catalog;
    use crate::model::ClusterQuota;
    use std::collections::{BTreeMap, BTreeSet};

    #[test]
    fn fixture_ids_are_unique_per_collection() {
        let catalog = Catalog::fixtures();
        let ids = catalog
            .kustomizations
            .iter()
            .map(|k| k.id)
            .collect::<BTreeSet<_>>();
        assert_eq!(ids.len(), catalog.kustomizations.len());
        let ids = catalog
            .applications
            .iter()
            .map(|a| a.id)
            .collect::<BTreeSet<_>>();
        assert_eq!(ids.len(), catalog.applications.len());
    }

    #[test]
    fn deploy_targets_keep_fixed_order_and_append_overrides() {
        let mut catalog = Catalog::fixtures();
        assert_eq!(catalog.deploy_targets(), vec!["SIT", "SIT1", "UAT", "PRD"]);

        let mut overrides = BTreeMap::new();
        overrides.insert(
            "DR".to_string(),
            ClusterQuota {
                cpu: "1".to_string(),
                ..ClusterQuota::default()
            },
        );
        overrides.insert(
            "UAT".to_string(),
            ClusterQuota {
                cpu: "6".to_string(),
                ..ClusterQuota::default()
            },
        );
        catalog.merge_cluster_overrides(&overrides);

        assert_eq!(
            catalog.deploy_targets(),
            vec!["SIT", "SIT1", "UAT", "PRD", "DR"]
        );
        assert_eq!(
            catalog.cluster_quota("UAT").map(|q| q.cpu.as_str()),
            Some("6")
        );
    }
}
