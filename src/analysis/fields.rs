//! Field table: one forward pass mapping field names to their declarations.

use std::collections::HashMap;

use super::line::{self, field_declaration, qualifier_literal};
use super::model::FieldEntry;
use crate::types::SourceRange;

/// Fields declared in one document, keyed by name.
///
/// Duplicate names keep the last declaration.
#[derive(Debug, Clone, Default)]
pub struct FieldTable {
    entries: HashMap<String, FieldEntry>,
}

impl FieldTable {
    pub fn build(lines: &[&str]) -> Self {
        let mut entries = HashMap::new();

        for (idx, text) in lines.iter().enumerate() {
            if line::is_comment(text.trim()) {
                continue;
            }
            let Some(field) = field_declaration(text) else {
                continue;
            };

            // Annotations commonly sit on the line above their field, unless
            // that line is itself a field owning the qualifier.
            let qualifier = qualifier_literal(text)
                .or_else(|| {
                    idx.checked_sub(1)
                        .map(|prev| lines[prev])
                        .filter(|prev| field_declaration(prev).is_none())
                        .and_then(qualifier_literal)
                })
                .map(str::to_string);

            let line_no = idx as u32;
            entries.insert(
                field.name.text.to_string(),
                FieldEntry {
                    name: field.name.text.to_string(),
                    field_type: field.ty.text.to_string(),
                    range: SourceRange::on_line(line_no, field.ty.column, field.ty.text.len()),
                    declaration_line: line_no,
                    qualifier,
                },
            );
        }

        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&FieldEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldEntry> {
        self.entries.values()
    }
}
