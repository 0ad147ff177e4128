use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationKind {
    Repository,
    BuiltinTemplate,
    ExternalTemplate,
    Cluster,
}

impl VerificationKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Repository => "repository",
            Self::BuiltinTemplate => "built-in template",
            Self::ExternalTemplate => "external template",
            Self::Cluster => "cluster",
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct VerificationRequest {
    pub kind: VerificationKind,
    pub identifier: String,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VerificationResponse {
    pub ok: bool,
    pub message: String,
}

impl VerificationResponse {
    pub fn passed(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// External service that checks repositories, templates and clusters before
/// a deployment is submitted.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(&self, request: &VerificationRequest) -> Result<VerificationResponse>;
}

/// In-process verifier with fixed rules and an artificial latency.
#[derive(Debug, Clone)]
pub struct StaticVerifier {
    delay: Duration,
    builtin_templates: Vec<String>,
    clusters: Vec<String>,
}

impl StaticVerifier {
    pub fn new(delay: Duration, builtin_templates: Vec<String>, clusters: Vec<String>) -> Self {
        Self {
            delay,
            builtin_templates,
            clusters,
        }
    }

    fn check(&self, request: &VerificationRequest) -> VerificationResponse {
        let identifier = request.identifier.trim();
        match request.kind {
            VerificationKind::Repository | VerificationKind::ExternalTemplate => {
                match parse_https_repository(identifier) {
                    Some((host, owner, name)) => {
                        VerificationResponse::passed(format!("{host}: {owner}/{name} reachable"))
                    }
                    None => VerificationResponse::failed(
                        "expected https://<host>/<owner>/<repository>",
                    ),
                }
            }
            VerificationKind::BuiltinTemplate => {
                if self.builtin_templates.iter().any(|name| name == identifier) {
                    VerificationResponse::passed(format!("template {identifier} available"))
                } else {
                    VerificationResponse::failed(format!("unknown template {identifier}"))
                }
            }
            VerificationKind::Cluster => {
                if self.clusters.iter().any(|name| name == identifier) {
                    VerificationResponse::passed(format!("cluster {identifier} accepts workloads"))
                } else {
                    VerificationResponse::failed(format!("unknown cluster {identifier}"))
                }
            }
        }
    }
}

#[async_trait]
impl Verifier for StaticVerifier {
    async fn verify(&self, request: &VerificationRequest) -> Result<VerificationResponse> {
        debug!(
            "verifying {} {}",
            request.kind.label(),
            request.identifier
        );
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.check(request))
    }
}

/// Splits `https://host/owner/name[.git]` into its parts.
fn parse_https_repository(url: &str) -> Option<(&str, &str, &str)> {
    let rest = url.strip_prefix("https://")?;
    let mut parts = rest.trim_end_matches('/').split('/');
    let host = parts.next().filter(|host| host.contains('.'))?;
    let owner = parts.next().filter(|owner| !owner.is_empty())?;
    let name = parts
        .next()
        .map(|name| name.trim_end_matches(".git"))
        .filter(|name| !name.is_empty())?;
    if parts.next().is_some() {
        return None;
    }
    Some((host, owner, name))
}

#[cfg(test)]
mod tests {
    use super::{
        StaticVerifier, VerificationKind, VerificationRequest, Verifier, parse_https_repository,
    };
    use std::time::Duration;

    fn verifier() -> StaticVerifier {
        StaticVerifier::new(
            Duration::ZERO,
            vec!["web-service".to_string()],
            vec!["SIT".to_string(), "UAT".to_string()],
        )
    }

    fn request(kind: VerificationKind, identifier: &str) -> VerificationRequest {
        VerificationRequest {
            kind,
            identifier: identifier.to_string(),
        }
    }

    #[test]
    fn repository_urls_need_host_owner_and_name() {
        assert_eq!(
            parse_https_repository("https://github.com/org/argocd.git"),
            Some(("github.com", "org", "argocd"))
        );
        assert_eq!(
            parse_https_repository("https://github.com/org/argocd/"),
            Some(("github.com", "org", "argocd"))
        );
        assert_eq!(parse_https_repository("http://github.com/org/argocd"), None);
        assert_eq!(parse_https_repository("https://github.com/org"), None);
        assert_eq!(parse_https_repository("https://localhost/org/repo"), None);
        assert_eq!(parse_https_repository("https://github.com/a/b/c"), None);
    }

    #[tokio::test]
    async fn static_rules_decide_outcomes() {
        let verifier = verifier();

        let ok = verifier
            .verify(&request(
                VerificationKind::Repository,
                "https://github.com/org/loki-config",
            ))
            .await
            .expect("verify");
        assert!(ok.ok);

        let bad = verifier
            .verify(&request(VerificationKind::Repository, "git@github.com:org/x"))
            .await
            .expect("verify");
        assert!(!bad.ok);

        let template = verifier
            .verify(&request(VerificationKind::BuiltinTemplate, "web-service"))
            .await
            .expect("verify");
        assert!(template.ok);

        let cluster = verifier
            .verify(&request(VerificationKind::Cluster, "PRD"))
            .await
            .expect("verify");
        assert!(!cluster.ok);
        assert_eq!(cluster.message, "unknown cluster PRD");
    }
}
