//! `rgql query` / `rgql mutate` – run an operation through the retrying client.

use anyhow::{bail, Context, Result};
use rgql_core::client::Client;
use rgql_core::config::RgqlConfig;
use rgql_core::retry::{CancelSignal, RetryError, Variables};
use std::path::Path;
use std::time::Duration;

use crate::cli::OperationArgs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

pub async fn run_operation(cfg: &RgqlConfig, kind: OperationKind, args: &OperationArgs) -> Result<()> {
    let document = load_document(&args.document)?;
    let variables = parse_variables(args.variables.as_deref())?;

    let mut client_cfg = cfg.to_client_config();
    if let Some(endpoint) = &args.endpoint {
        client_cfg.endpoint = endpoint.clone();
    }
    if let Some(token) = &args.token {
        client_cfg.token = Some(token.clone());
    }
    let client = Client::new(client_cfg)?;

    let mut cancel = CancelSignal::new();
    if let Some(secs) = args.deadline {
        cancel = cancel.with_timeout(Duration::from_secs(secs));
    }
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted; cancelling request");
            on_interrupt.cancel();
        }
    });

    let name = args.operation_name.as_deref();
    let result = match kind {
        OperationKind::Query => client.query(&cancel, &document, variables, name).await,
        OperationKind::Mutation => client.mutate(&cancel, &document, variables, name).await,
    };
    interrupt.abort();

    match result {
        Ok(data) => {
            println!("{}", serde_json::to_string_pretty(&data)?);
            Ok(())
        }
        Err(RetryError::Failed(err)) => {
            eprintln!("{}", err.to_json());
            Err(RetryError::Failed(err).into())
        }
        Err(err) => Err(err.into()),
    }
}

/// Inline document, or the contents of a file when prefixed with `@`.
pub(crate) fn load_document(arg: &str) -> Result<String> {
    let document = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(Path::new(path))
            .with_context(|| format!("failed to read document {}", path))?,
        None => arg.to_string(),
    };
    if document.trim().is_empty() {
        bail!("GraphQL document is empty");
    }
    Ok(document)
}

/// `--variables` must be a JSON object when given.
pub(crate) fn parse_variables(arg: Option<&str>) -> Result<Option<Variables>> {
    let Some(raw) = arg else {
        return Ok(None);
    };
    let value: serde_json::Value =
        serde_json::from_str(raw).context("--variables is not valid JSON")?;
    match value {
        serde_json::Value::Object(map) => Ok(Some(map)),
        serde_json::Value::Null => Ok(None),
        other => bail!("--variables must be a JSON object, got {}", other),
    }
}
