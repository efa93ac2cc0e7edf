//! Usages command: injection points receiving a bean.

use std::path::Path;

use tokio_util::sync::CancellationToken;

use super::{Workspace, zero_based};
use crate::analysis::UsageRequest;

pub async fn run_usages(
    workspace: &Workspace,
    type_name: &str,
    file: &Path,
    line: u32,
    qualifier: Option<String>,
    primary: bool,
) -> anyhow::Result<()> {
    let request = UsageRequest::new(type_name, workspace.document(file)?, zero_based(line)?)
        .with_qualifier(qualifier)
        .with_primary(primary);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    eprintln!("Scanning injection points for {type_name}...");
    let outcome = workspace.analyzer.find_usages(&request, &cancel).await;
    interrupt.abort();

    if outcome.was_cancelled() {
        eprintln!("Cancelled; showing results collected so far.");
    }
    println!("{}", outcome.message(&request));
    for location in outcome.locations() {
        println!("  {}", workspace.display(location));
    }
    Ok(())
}
