//! Tools command handler.
//!
//! Starts every configured server through the configured framework's adapter,
//! reports what each one resolved to and shuts them all down again.

use anyagent_core::{McpToolsConfig, ServerSpec};
use anyagent_mcp::{McpRegistry, ResolvedTool};
use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::path::Path;

use crate::presentation::{print_separator, truncate_string};

/// Outcome of starting one server.
#[derive(Debug)]
pub struct ServerReport {
    pub command: String,
    pub tools: Vec<ResolvedTool>,
    pub error: Option<String>,
}

/// Execute the tools command.
pub async fn execute(config_path: &Path, framework: Option<&str>, json: bool) -> Result<()> {
    let mut config = McpToolsConfig::load(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    config.apply_framework_override(framework)?;

    if config.servers.is_empty() {
        println!("No MCP servers configured in {}.", config_path.display());
        return Ok(());
    }

    let registry = McpRegistry::new();
    let reports = probe(&registry, &config).await;
    registry.shutdown().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&reports_to_json(&reports))?);
    } else {
        print_reports(&config, &reports);
    }

    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} MCP server(s) failed to start", reports.len());
    }
    Ok(())
}

/// Set up every server in `config` on `registry`, in order.
///
/// Failures are recorded in the report rather than aborting the run. The
/// caller owns shutting the registry down.
pub async fn probe(registry: &McpRegistry, config: &McpToolsConfig) -> Vec<ServerReport> {
    let mut reports = Vec::with_capacity(config.servers.len());

    for spec in &config.servers {
        let command = spec.command_line();
        let report = match registry.setup(spec.clone(), config.framework).await {
            Ok(server) => ServerReport {
                command,
                tools: server.tools,
                error: None,
            },
            Err(e) => {
                tracing::debug!(command = %command, error = %e, "MCP server failed to start");
                ServerReport {
                    command,
                    tools: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        };
        reports.push(report);
    }

    reports
}

fn print_reports(config: &McpToolsConfig, reports: &[ServerReport]) {
    println!(
        "Framework: {} ({} server(s))\n",
        config.framework,
        reports.len()
    );

    for (spec, report) in config.servers.iter().zip(reports) {
        println!("{}", report.command);
        if let Some(filter) = allow_list_label(spec) {
            println!("  allow-list: {filter}");
        }

        if let Some(error) = &report.error {
            println!("  error: {error}\n");
            continue;
        }

        println!("  {:<28} Description", "Tool");
        print!("  ");
        print_separator(78);
        for tool in &report.tools {
            println!(
                "  {:<28} {}",
                truncate_string(tool.name(), 27),
                truncate_string(tool.description().unwrap_or("--"), 50)
            );
        }
        println!();
    }
}

fn allow_list_label(spec: &ServerSpec) -> Option<String> {
    spec.allow_list()
        .map(|tools| tools.iter().cloned().collect::<Vec<_>>().join(", "))
}

fn reports_to_json(reports: &[ServerReport]) -> Value {
    reports
        .iter()
        .map(|report| {
            json!({
                "command": report.command,
                "error": report.error,
                "tools": report.tools.iter().map(ResolvedTool::definition).collect::<Vec<_>>(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyagent_core::AgentFramework;
    use anyagent_mcp::testing::{FakeConnector, FakeServer};
    use std::sync::Arc;

    fn config() -> McpToolsConfig {
        McpToolsConfig::new(AgentFramework::Langchain)
            .with_server(ServerSpec::new("echo-server", ["--port", "0"]).with_tools(["search"]))
            .with_server(ServerSpec::new("echo-server", ["--port", "1"]).with_tools(["translate"]))
    }

    #[tokio::test]
    async fn test_probe_reports_each_server() {
        let connector = Arc::new(FakeConnector::new(FakeServer::with_tools(&[
            "search", "fetch",
        ])));
        let registry = McpRegistry::with_connector(connector.clone());

        let reports = probe(&registry, &config()).await;

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].command, "echo-server --port 0");
        assert_eq!(reports[0].tools.len(), 1);
        assert!(reports[0].error.is_none());
        assert!(reports[1].error.as_deref().unwrap().contains("translate"));

        assert_eq!(registry.shutdown().await, 2);
        assert!(connector.connections().iter().all(|t| t.is_closed()));
    }

    #[tokio::test]
    async fn test_reports_to_json_includes_schemas() {
        let connector = Arc::new(FakeConnector::new(FakeServer::with_tools(&["search"])));
        let registry = McpRegistry::with_connector(connector);

        let reports = probe(&registry, &config()).await;
        let value = reports_to_json(&reports);
        registry.shutdown().await;

        assert_eq!(value[0]["tools"][0]["name"], "search");
        // LangChain converts tools, so a schema is always present
        assert_eq!(value[0]["tools"][0]["inputSchema"]["type"], "object");
        assert!(value[1]["error"].is_string());
    }

    #[tokio::test]
    async fn test_execute_rejects_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let err = execute(&dir.path().join("missing.json"), None, false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to load"));
    }
}
