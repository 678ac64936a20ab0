//! Ingress controller discovery.
//!
//! Lists services carrying the ingress-controller label across all
//! namespaces, then resolves each service to its backing pod through the
//! service's selector.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use ingress_core::config::DiscoveryConfig;
use ingress_core::{Discovery, DiscoveryError, Target};

use crate::kubectl::Kubectl;

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct List<T> {
    #[serde(default)]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ObjectMeta {
    name: String,
    #[serde(default)]
    namespace: String,
}

#[derive(Debug, Deserialize)]
struct Service {
    metadata: ObjectMeta,
    #[serde(default)]
    spec: ServiceSpec,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceSpec {
    #[serde(default)]
    selector: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct Pod {
    metadata: ObjectMeta,
}

/// Discovers ingress controller pods via `kubectl get`.
pub struct KubectlDiscovery {
    kubectl: Kubectl,
    label_selector: String,
    all_pods: bool,
}

impl KubectlDiscovery {
    pub fn new(kubectl: Kubectl, label_selector: impl Into<String>) -> Self {
        Self {
            kubectl,
            label_selector: label_selector.into(),
            all_pods: false,
        }
    }

    pub fn from_config(kubectl: Kubectl, config: &DiscoveryConfig) -> Self {
        Self::new(kubectl, config.label_selector()).with_all_pods(config.all_pods)
    }

    /// Scrape every pod behind a service instead of only the first.
    pub fn with_all_pods(mut self, all_pods: bool) -> Self {
        self.all_pods = all_pods;
        self
    }

    async fn list_services(&self) -> Result<Vec<Service>, DiscoveryError> {
        let list: List<Service> = self
            .kubectl
            .get_json(&[
                "get",
                "services",
                "--all-namespaces",
                "-l",
                self.label_selector.as_str(),
                "-o",
                "json",
            ])
            .await?;
        Ok(list.items)
    }

    async fn list_pods(&self, namespace: &str, selector: &str) -> Result<Vec<Pod>, DiscoveryError> {
        let list: List<Pod> = self
            .kubectl
            .get_json(&["get", "pods", "-n", namespace, "-l", selector, "-o", "json"])
            .await?;
        Ok(list.items)
    }
}

#[async_trait]
impl Discovery for KubectlDiscovery {
    async fn list_targets(&self) -> Result<Vec<Target>, DiscoveryError> {
        let services = self.list_services().await?;
        if services.is_empty() {
            return Err(DiscoveryError::NoTargets {
                selector: self.label_selector.clone(),
            });
        }

        let mut seen = HashSet::new();
        let mut targets = Vec::new();

        for service in services {
            let namespace = service.metadata.namespace;
            let name = service.metadata.name;

            let selector = match service.spec.selector.as_ref().and_then(selector_string) {
                Some(selector) => selector,
                None => {
                    return Err(DiscoveryError::MissingSelector {
                        namespace,
                        service: name,
                    });
                }
            };

            let pods = self.list_pods(&namespace, &selector).await?;
            if pods.is_empty() {
                return Err(DiscoveryError::NoBackingPod {
                    namespace,
                    service: name,
                    selector,
                });
            }

            let take = if self.all_pods { pods.len() } else { 1 };
            for pod in pods.into_iter().take(take) {
                let target = Target::new(namespace.clone(), pod.metadata.name);
                if seen.insert(target.clone()) {
                    debug!(service = %name, %target, "resolved ingress controller pod");
                    targets.push(target);
                }
            }
        }

        info!(count = targets.len(), "discovered ingress controller pods");
        Ok(targets)
    }
}

/// Join a service selector into `k=v,k=v`, ordered by key.
///
/// Returns `None` for an empty selector, which would otherwise match
/// every pod in the namespace.
fn selector_string(selector: &BTreeMap<String, String>) -> Option<String> {
    if selector.is_empty() {
        return None;
    }
    Some(
        selector
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(","),
    )
}
