use crate::model::ClusterQuota;
use std::collections::BTreeMap;

const FALLBACK_NAMESPACE: &str = "default";
const FALLBACK_ENVIRONMENT: &str = "dev";
const FALLBACK_QUOTA_TARGET: &str = "SIT";

/// Renders the read-only deployment descriptor shown next to the deploy form.
///
/// Limits come from the quota of `target` (or SIT when no target is chosen).
/// Quota cpu is in cores and is written as millicores.
pub fn render_descriptor(
    namespace: &str,
    target: Option<&str>,
    cluster_defaults: &BTreeMap<String, ClusterQuota>,
) -> String {
    let namespace = non_empty(namespace).unwrap_or(FALLBACK_NAMESPACE);
    let environment = target.and_then(non_empty).unwrap_or(FALLBACK_ENVIRONMENT);
    let quota = target
        .and_then(|name| cluster_defaults.get(name))
        .or_else(|| cluster_defaults.get(FALLBACK_QUOTA_TARGET))
        .cloned()
        .unwrap_or_default();
    let cpu_limit = millicores(&quota.cpu);
    let memory_limit = non_empty(&quota.memory).unwrap_or("0");

    format!(
        r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: example-deployment
  namespace: {namespace}
  labels:
    app: example
    environment: {environment}
spec:
  replicas: 3
  strategy:
    type: RollingUpdate
    rollingUpdate:
      maxSurge: 1
      maxUnavailable: 0
  selector:
    matchLabels:
      app: example
  template:
    metadata:
      labels:
        app: example
      annotations:
        prometheus.io/scrape: "true"
        prometheus.io/port: "8080"
    spec:
      containers:
      - name: example-app
        image: nginx:1.14.2
        imagePullPolicy: Always
        ports:
        - name: http
          containerPort: 80
          protocol: TCP
        - name: metrics
          containerPort: 8080
          protocol: TCP
        resources:
          limits:
            cpu: "{cpu_limit}m"
            memory: "{memory_limit}Gi"
          requests:
            cpu: "500m"
            memory: "1Gi"
        livenessProbe:
          httpGet:
            path: /health
            port: http
          initialDelaySeconds: 30
          periodSeconds: 10
        readinessProbe:
          httpGet:
            path: /ready
            port: http
          initialDelaySeconds: 5
          periodSeconds: 10
      securityContext:
        runAsNonRoot: true
        runAsUser: 1000
      serviceAccountName: example-sa
"#
    )
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn millicores(cores: &str) -> String {
    match cores.trim().parse::<f64>() {
        Ok(value) if value >= 0.0 => format!("{}", (value * 1000.0).round() as u64),
        _ => "0".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{millicores, render_descriptor};
    use crate::catalog::Catalog;

    #[test]
    fn descriptor_uses_target_quota() {
        let catalog = Catalog::fixtures();
        let text = render_descriptor("payments", Some("PRD"), &catalog.cluster_defaults);
        assert!(text.contains("namespace: payments"));
        assert!(text.contains("environment: PRD"));
        assert!(text.contains(r#"cpu: "8000m""#));
        assert!(text.contains(r#"memory: "16Gi""#));
    }

    #[test]
    fn blank_inputs_fall_back_to_defaults() {
        let catalog = Catalog::fixtures();
        let text = render_descriptor("  ", None, &catalog.cluster_defaults);
        assert!(text.contains("namespace: default"));
        assert!(text.contains("environment: dev"));
        assert!(text.contains(r#"cpu: "2000m""#));
    }

    #[test]
    fn fractional_cores_round_to_millicores() {
        assert_eq!(millicores("0.5"), "500");
        assert_eq!(millicores("abc"), "0");
    }
}
