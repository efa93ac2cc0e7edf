//! Scan command: beans and injection sites of one file.

use std::path::Path;

use comfy_table::{Table, presets::UTF8_FULL};

use super::Workspace;
use crate::analysis::DocumentAnalysis;

pub async fn run_scan(workspace: &Workspace, file: &Path, json: bool) -> anyhow::Result<()> {
    let (_, analysis) = workspace.load(file, true).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }
    print_tables(workspace, &analysis);
    Ok(())
}

fn print_tables(workspace: &Workspace, analysis: &DocumentAnalysis) {
    let output = &analysis.output;
    if output.beans.is_empty() && output.injections.is_empty() {
        println!("No beans or injection points found.");
        return;
    }

    if !output.beans.is_empty() {
        let mut beans = Table::new();
        beans
            .load_preset(UTF8_FULL)
            .set_header(vec!["Line", "Bean", "Type", "Qualifier", "Primary", "Defined"]);
        for bean in &output.beans {
            beans.add_row(vec![
                (bean.range.line() + 1).to_string(),
                bean.name.clone(),
                bean.produced_type.clone(),
                bean.qualifier.clone().unwrap_or_default(),
                if bean.is_primary { "yes" } else { "" }.to_string(),
                bean.description.clone(),
            ]);
        }
        println!("Bean definitions\n{beans}");
    }

    if !output.injections.is_empty() {
        let mut injections = Table::new();
        injections
            .load_preset(UTF8_FULL)
            .set_header(vec!["Line", "Type", "Name", "Qualifier", "Via"]);
        for site in &output.injections {
            injections.add_row(vec![
                (site.range.line() + 1).to_string(),
                site.consumed_type.clone(),
                site.variable_name.clone(),
                site.qualifier.clone().unwrap_or_default(),
                site.method.label().to_string(),
            ]);
        }
        println!("Injection points\n{injections}");
    }

    for (class_name, location) in &analysis.external {
        println!("{class_name} is defined at {}", workspace.display(location));
    }
}
