//! Fake `kubectl` executables for adapter tests.
//!
//! All scripts are written once, before any test spawns a process, so no
//! script is exec'd while another thread still holds it open for writing.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tempfile::TempDir;

static FIXTURES: OnceLock<TempDir> = OnceLock::new();

const SERVICES_JSON: &str = r#"{
  "apiVersion": "v1",
  "kind": "List",
  "items": [
    {
      "metadata": {"name": "nginx-ingress", "namespace": "ingress", "labels": {"service-type": "ingress-controller-service"}},
      "spec": {"selector": {"app": "nginx", "tier": "edge"}, "type": "LoadBalancer"}
    },
    {
      "metadata": {"name": "haproxy", "namespace": "edge", "labels": {"service-type": "ingress-controller-service"}},
      "spec": {"selector": {"app": "haproxy"}}
    }
  ]
}"#;

const INGRESS_PODS_JSON: &str = r#"{
  "items": [
    {"metadata": {"name": "nginx-7d9c-abcde", "namespace": "ingress"}, "status": {"phase": "Running"}},
    {"metadata": {"name": "nginx-7d9c-fghij", "namespace": "ingress"}, "status": {"phase": "Running"}}
  ]
}"#;

const EDGE_PODS_JSON: &str = r#"{
  "items": [
    {"metadata": {"name": "haproxy-0", "namespace": "edge"}}
  ]
}"#;

/// Answers discovery queries for two services; fails anything else.
const DISCOVERY_OK: &str = r#"#!/bin/sh
case "$*" in
  *"get services --all-namespaces -l service-type=ingress-controller-service -o json"*)
    cat "$FIXTURE_DIR/services.json" ;;
  *"get pods -n ingress -l app=nginx,tier=edge -o json"*)
    cat "$FIXTURE_DIR/ingress-pods.json" ;;
  *"get pods -n edge -l app=haproxy -o json"*)
    cat "$FIXTURE_DIR/edge-pods.json" ;;
  *)
    echo "unexpected args: $*" >&2
    exit 2 ;;
esac
"#;

/// Services resolve, but the edge namespace has no pods.
const DISCOVERY_NO_PODS: &str = r#"#!/bin/sh
case "$*" in
  *"get services"*) cat "$FIXTURE_DIR/services.json" ;;
  *"get pods -n ingress"*) cat "$FIXTURE_DIR/ingress-pods.json" ;;
  *) echo '{"items": []}' ;;
esac
"#;

const DISCOVERY_EMPTY: &str = r#"#!/bin/sh
echo '{"apiVersion": "v1", "items": []}'
"#;

const DISCOVERY_NO_SELECTOR: &str = r#"#!/bin/sh
echo '{"items": [{"metadata": {"name": "external", "namespace": "ingress"}, "spec": {"type": "ExternalName"}}]}'
"#;

const DISCOVERY_UNREACHABLE: &str = r#"#!/bin/sh
echo "Unable to connect to the server: dial tcp 127.0.0.1:6443: connect: connection refused" >&2
exit 1
"#;

const DISCOVERY_GARBAGE: &str = r#"#!/bin/sh
echo "this is not json"
"#;

/// Log retrieval: `-n <ns> logs <pod> [flags]`.
const LOGS: &str = r#"#!/bin/sh
pod="$4"
case "$pod" in
  podA)
    printf '%s\n' 'NGINX Ingress controller'
    printf '%s\r\n' '10.0.0.1 - - [t] "GET /foo HTTP/1.1" 200 12 "/foo" "ua" "-"'
    printf '\n'
    printf '%s\n' '10.0.0.1 - - [t] "GET /bar HTTP/1.1" 200 5 "-" "ua" "-"'
    printf '%s' '10.0.0.1 - - [t] "GET /foo HTTP/1.1" 200 12 "/foo" "ua" "-"'
    ;;
  broken)
    printf '%s\n' '10.0.0.1 - - [t] "GET /foo HTTP/1.1" 200 12 "/foo" "ua" "-"'
    echo "Error from server (NotFound): pods \"broken\" not found" >&2
    exit 1 ;;
  args)
    echo "$*" ;;
  slow)
    printf '%s\n' 'first'
    sleep 30 ;;
esac
"#;

fn dir() -> &'static Path {
    FIXTURES
        .get_or_init(|| {
            let dir = tempfile::tempdir().unwrap();
            let root = dir.path();

            std::fs::write(root.join("services.json"), SERVICES_JSON).unwrap();
            std::fs::write(root.join("ingress-pods.json"), INGRESS_PODS_JSON).unwrap();
            std::fs::write(root.join("edge-pods.json"), EDGE_PODS_JSON).unwrap();

            for (name, body) in [
                ("discovery-ok", DISCOVERY_OK),
                ("discovery-no-pods", DISCOVERY_NO_PODS),
                ("discovery-empty", DISCOVERY_EMPTY),
                ("discovery-no-selector", DISCOVERY_NO_SELECTOR),
                ("discovery-unreachable", DISCOVERY_UNREACHABLE),
                ("discovery-garbage", DISCOVERY_GARBAGE),
                ("logs", LOGS),
            ] {
                let path = root.join(name);
                let body = body.replace("$FIXTURE_DIR", &root.display().to_string());
                std::fs::write(&path, body).unwrap();
                std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            }

            dir
        })
        .path()
}

/// Path to a fake `kubectl` script by name.
pub fn fake_kubectl(name: &str) -> PathBuf {
    dir().join(name)
}
