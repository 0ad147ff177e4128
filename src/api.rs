use crate::draft::DeploymentPayload;
use crate::model::RecordId;
use crate::panel::PanelKind;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkAction {
    Delete,
    Sync,
}

impl BulkAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Sync => "sync",
        }
    }

    pub fn requires_confirmation(self) -> bool {
        matches!(self, Self::Delete)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct BulkRequest {
    pub action: BulkAction,
    #[serde(serialize_with = "serialize_panel")]
    pub resource: PanelKind,
    pub ids: Vec<RecordId>,
    pub names: Vec<String>,
}

fn serialize_panel<S>(kind: &PanelKind, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(kind.resource_name())
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BulkOutcome {
    pub affected: usize,
    pub message: String,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DeploymentReceipt {
    pub application: String,
    pub message: String,
}

/// Resource-management API used for bulk actions on selected rows.
#[async_trait]
pub trait ResourceApi: Send + Sync {
    async fn apply(&self, request: &BulkRequest) -> Result<BulkOutcome>;
}

/// Deployment API receiving submitted deploy drafts.
#[async_trait]
pub trait DeploymentApi: Send + Sync {
    async fn deploy(&self, payload: &DeploymentPayload) -> Result<DeploymentReceipt>;
}

/// Stand-in backend that records every call in the log and reports success.
#[derive(Debug, Clone, Default)]
pub struct LoggingBackend;

#[async_trait]
impl ResourceApi for LoggingBackend {
    async fn apply(&self, request: &BulkRequest) -> Result<BulkOutcome> {
        if request.ids.is_empty() {
            bail!("no {} selected", request.resource.resource_name());
        }

        let body = serde_json::to_string(request).context("failed to encode bulk request")?;
        info!(
            "{} {} {}: {}",
            request.action.label(),
            request.ids.len(),
            request.resource.resource_name(),
            body
        );

        let affected = request.ids.len();
        Ok(BulkOutcome {
            affected,
            message: format!(
                "{} requested for {} {}: {}",
                request.action.label(),
                affected,
                request.resource.resource_name(),
                request.names.join(", ")
            ),
        })
    }
}

#[async_trait]
impl DeploymentApi for LoggingBackend {
    async fn deploy(&self, payload: &DeploymentPayload) -> Result<DeploymentReceipt> {
        if payload.tenant_name.is_empty() || payload.app_code.is_empty() {
            bail!("deployment needs a tenant name and an app code");
        }

        let body =
            serde_json::to_string(payload).context("failed to encode deployment payload")?;
        info!("deploy {}/{}: {}", payload.tenant_name, payload.app_code, body);

        let application = format!("{}-{}", payload.tenant_name, payload.app_code).to_lowercase();
        let target = payload.target.as_deref().unwrap_or("default target");
        Ok(DeploymentReceipt {
            message: format!("deployment of {application} to {target} submitted"),
            application,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{BulkAction, BulkRequest, DeploymentApi, LoggingBackend, ResourceApi};
    use crate::catalog::Catalog;
    use crate::draft::{DeployDraft, DraftField, DraftOptions};
    use crate::panel::PanelKind;

    fn request(ids: Vec<u32>) -> BulkRequest {
        BulkRequest {
            action: BulkAction::Sync,
            resource: PanelKind::Kustomizations,
            names: ids.iter().map(|id| format!("k-{id}")).collect(),
            ids,
        }
    }

    #[test]
    fn bulk_request_json_names_the_resource() {
        let json = serde_json::to_value(request(vec![1, 3])).expect("serialize");
        assert_eq!(json["action"], "sync");
        assert_eq!(json["resource"], "kustomizations");
        assert_eq!(json["ids"], serde_json::json!([1, 3]));
    }

    #[tokio::test]
    async fn bulk_apply_reports_affected_rows() {
        let outcome = LoggingBackend
            .apply(&request(vec![1, 2]))
            .await
            .expect("apply");
        assert_eq!(outcome.affected, 2);
        assert!(outcome.message.contains("k-1, k-2"));
    }

    #[tokio::test]
    async fn empty_bulk_request_is_rejected() {
        assert!(LoggingBackend.apply(&request(Vec::new())).await.is_err());
    }

    #[tokio::test]
    async fn deploy_requires_identity_fields() {
        let mut draft = DeployDraft::new(DraftOptions::from_catalog(&Catalog::fixtures()));
        assert!(LoggingBackend.deploy(&draft.submit()).await.is_err());

        draft.set_text(DraftField::TenantName, "Tenant-A");
        draft.set_text(DraftField::AppCode, "PAY");
        draft.select_target("SIT1");
        let receipt = LoggingBackend
            .deploy(&draft.submit())
            .await
            .expect("deploy");
        assert_eq!(receipt.application, "tenant-a-pay");
        assert!(receipt.message.ends_with("to SIT1 submitted"));
    }
}
