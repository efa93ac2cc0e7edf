//! Resolve and Class commands.

use std::path::Path;

use super::{Workspace, zero_based};
use crate::analysis::{BeanTarget, ResolutionResult};

pub async fn run_resolve(
    workspace: &Workspace,
    type_name: &str,
    file: &Path,
    line: u32,
    qualifier: Option<&str>,
) -> anyhow::Result<()> {
    let line = zero_based(line)?;
    let (path, _) = workspace.load(file, false).await?;
    let target = workspace
        .analyzer
        .go_to_bean(type_name, &path, line, qualifier)
        .await;

    println!("{}", target.message(type_name));
    match &target {
        BeanTarget::Definition(result) => print_result(workspace, result),
        BeanTarget::AnnotatedImplementation(location) => {
            println!("  {}", workspace.display(location));
        }
        BeanTarget::NotFound => {}
    }
    Ok(())
}

pub async fn run_class(
    workspace: &Workspace,
    type_name: &str,
    file: &Path,
    line: u32,
) -> anyhow::Result<()> {
    let line = zero_based(line)?;
    let path = workspace.document(file)?;
    let result = workspace.analyzer.go_to_class(type_name, &path, line).await;
    if !result.is_resolved() {
        println!("No implementations found for {type_name}.");
    }
    print_result(workspace, &result);
    Ok(())
}

fn print_result(workspace: &Workspace, result: &ResolutionResult) {
    match result {
        ResolutionResult::Resolved(location) => println!("  {}", workspace.display(location)),
        ResolutionResult::Ambiguous(candidates) => {
            for location in candidates {
                println!("  {}", workspace.display(location));
            }
        }
        ResolutionResult::Unresolved => {}
    }
}
