//! ingressd: ingress controller access-log exporter.
//!
//! Serves `/metrics` on port 8000 by default. Every scrape discovers the
//! ingress controller pods, reads their access logs and renders per-path
//! request counts. A synthetic workload feeds `request_processing_seconds`
//! unless `--no-demo` is given.
//!
//! # Usage
//!
//! ```text
//! KUBE_CONFIG=~/.kube/config CONTEXT=prod ingressd --port 8000
//! ingressd --config /etc/ingressd.toml --print-config
//! ```

mod demo;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ingress_api::{ApiState, build_router};
use ingress_core::ExporterConfig;
use ingress_kube::{Kubectl, KubectlDiscovery, KubectlLogSource};
use ingress_logparse::LogParser;
use ingress_metrics::{IngressCollector, LatencySummary};

const DEFAULT_LOG_FILTER: &str = "info,ingressd=debug,ingress=debug";

#[derive(Parser)]
#[command(name = "ingressd", about = "Ingress controller access-log exporter", version)]
struct Cli {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to serve metrics on.
    #[arg(long)]
    port: Option<u16>,

    /// Address to bind.
    #[arg(long)]
    bind: Option<String>,

    /// Path to the kubeconfig file.
    #[arg(long)]
    kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use.
    #[arg(long)]
    context: Option<String>,

    /// Scrape every pod behind a controller service, not only the first.
    #[arg(long)]
    all_pods: bool,

    /// Disable the synthetic request_processing_seconds workload.
    #[arg(long)]
    no_demo: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,

    /// Print the resolved configuration and exit.
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    /// Defaults, then the config file, then the environment, then flags.
    fn resolve_config(&self) -> anyhow::Result<ExporterConfig> {
        let mut config = match &self.config {
            Some(path) => ExporterConfig::from_file(path)?,
            None => ExporterConfig::default(),
        };
        config.apply_process_env();

        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(path) = &self.kubeconfig {
            config.kubectl.kubeconfig = Some(path.clone());
        }
        if let Some(context) = &self.context {
            config.kubectl.context = Some(context.clone());
        }
        if self.all_pods {
            config.discovery.all_pods = true;
        }
        if self.no_demo {
            config.demo.enabled = false;
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = cli.resolve_config()?;
    if cli.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    run(config).await
}

async fn run(config: ExporterConfig) -> anyhow::Result<()> {
    info!("ingress exporter starting");

    let kubectl = Kubectl::from_config(&config.kubectl);
    info!(
        program = kubectl.program(),
        context = ?config.kubectl.context,
        kubeconfig = ?config.kubectl.kubeconfig,
        "cluster access configured"
    );

    let discovery = KubectlDiscovery::from_config(kubectl.clone(), &config.discovery);
    let logs = KubectlLogSource::from_config(kubectl, &config.logs);
    let parser = LogParser::new().context("compiling access log pattern")?;

    let collector = Arc::new(IngressCollector::new(
        Arc::new(discovery),
        Arc::new(logs),
        parser,
        config.discovery.timeout(),
        config.logs.timeout(),
    ));
    info!(
        selector = %config.discovery.label_selector(),
        all_pods = config.discovery.all_pods,
        "collector initialized"
    );

    let summary = Arc::new(LatencySummary::request_processing());

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let demo_handle = if config.demo.enabled {
        let summary = summary.clone();
        Some(tokio::spawn(demo::run(summary, shutdown_rx)))
    } else {
        info!("demo workload disabled");
        None
    };

    // ── Start exposition server ────────────────────────────────

    let router = build_router(ApiState {
        collector,
        summary: Some(summary),
    });

    let bind = (config.server.bind.as_str(), config.server.port);
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {}:{}", bind.0, bind.1))?;
    info!(addr = %listener.local_addr()?, "metrics server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                return;
            }
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    if let Some(handle) = demo_handle {
        let _ = handle.await;
    }

    info!("ingress exporter stopped");
    Ok(())
}
