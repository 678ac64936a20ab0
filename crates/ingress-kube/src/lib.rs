//! ingress-kube: cluster adapters backed by `kubectl`.
//!
//! Both adapters shell out through a shared [`Kubectl`] handle built once
//! from [`KubectlConfig`](ingress_core::config::KubectlConfig). The
//! kubeconfig path, context and proxy are passed explicitly to every child
//! process; nothing is read from ambient client state.
//!
//! | Adapter | Command |
//! |---|---|
//! | [`KubectlDiscovery`] | `kubectl get services --all-namespaces -l <label> -o json`, then `kubectl get pods -n <ns> -l <selector> -o json` |
//! | [`KubectlLogSource`] | `kubectl -n <ns> logs <pod>` |

pub mod discovery;
pub mod kubectl;
pub mod logs;

pub use discovery::KubectlDiscovery;
pub use kubectl::Kubectl;
pub use logs::KubectlLogSource;

#[cfg(all(test, unix))]
pub(crate) mod testutil;
