//! Declaration scanner.
//!
//! Walks a document line by line carrying a small [`ScanState`]. Annotations
//! and the declarations they apply to are often on different lines, so each
//! step looks at one classified line, may emit records, and hands back the
//! state for the next line. Anything still pending at end of input is dropped.

use super::fields::FieldTable;
use super::line::{
    self, ClassifiedLine, Dialect, constructor_arguments, contains_word, declares_constructor,
    paren_balance,
};
use super::model::{
    BeanDefinition, BeanOrigin, DeclaredClass, InjectionMethod, InjectionSite, ScanOutput,
};
use crate::types::SourceRange;

/// Class whose body the scanner is currently in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassScope {
    pub name: String,
    pub range: SourceRange,
}

/// Flags carried from one line to the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanState {
    pub pending_bean_on_class: bool,
    pub pending_bean_on_method: bool,
    pub pending_primary: bool,
    pub last_qualifier: Option<String>,
    pub inside_annotated_constructor: bool,
    /// Open parentheses of the constructor signature being read.
    pub constructor_depth: i32,
    pub current_class: Option<ClassScope>,
}

/// A record produced by one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    Bean(BeanDefinition),
    Injection(InjectionSite),
    Class(DeclaredClass),
}

/// Result of applying one line to a state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub state: ScanState,
    pub emissions: Vec<Emission>,
}

/// Read-only inputs shared by every step of one scan.
#[derive(Debug, Clone, Copy)]
pub struct ScanContext<'a> {
    pub lines: &'a [&'a str],
    pub fields: &'a FieldTable,
    pub dialect: &'a Dialect,
    /// Document carries a generated-constructor marker.
    pub convention_constructor: bool,
}

impl ScanState {
    /// Apply line `idx` of the context and return the successor state.
    pub fn step(&self, idx: usize, ctx: &ScanContext<'_>) -> Step {
        let mut next = self.clone();
        let mut emissions = Vec::new();

        let Some(line) = ClassifiedLine::classify(ctx.lines[idx], ctx.dialect) else {
            return Step {
                state: next,
                emissions,
            };
        };
        let line_no = idx as u32;

        if let Some(qualifier) = line.qualifier {
            next.last_qualifier = Some(qualifier.to_string());
        }
        if line.primary {
            next.pending_primary = true;
        }
        if line.stereotype {
            next.pending_bean_on_class = true;
        }

        if let Some(name) = line.class_decl {
            let range = SourceRange::on_line(line_no, name.column, name.text.len());
            let annotated = next.pending_bean_on_class;
            if annotated {
                let bean = BeanDefinition::new(
                    name.text,
                    name.text,
                    range,
                    BeanOrigin::StereotypeAnnotation,
                )
                .with_qualifier(next.last_qualifier.take())
                .with_primary(next.pending_primary);
                emissions.push(Emission::Bean(bean));
                next.pending_bean_on_class = false;
            }
            // Markers above a class never reach its members
            next.last_qualifier = None;
            next.pending_primary = false;
            next.current_class = Some(ClassScope {
                name: name.text.to_string(),
                range,
            });
            emissions.push(Emission::Class(DeclaredClass {
                name: name.text.to_string(),
                range,
                annotated,
            }));
        }

        if line.factory {
            next.pending_bean_on_method = true;
        }
        if next.pending_bean_on_method {
            if line.is_annotation() && !line.factory {
                return Step {
                    state: next,
                    emissions,
                };
            }
            next.track_factory_method(&line, line_no, &mut emissions);
        }

        if let Some(class) = &next.current_class {
            if !next.inside_annotated_constructor && declares_constructor(line.text, &class.name) {
                let annotated_above = idx
                    .checked_sub(1)
                    .is_some_and(|prev| ctx.dialect.is_injection(ctx.lines[prev]));
                if line.injection || annotated_above {
                    next.inside_annotated_constructor = true;
                    next.constructor_depth = 0;
                }
            }
        }

        if next.inside_annotated_constructor {
            next.read_constructor_line(&line, line_no, ctx, &mut emissions);
            return Step {
                state: next,
                emissions,
            };
        }

        let mut injected_here = false;
        if line.injection {
            let field = line
                .field
                .map(|f| f.name.text)
                .or_else(|| annotated_field_below(idx, ctx));
            if let Some(entry) = field.and_then(|name| ctx.fields.get(name)) {
                emissions.push(Emission::Injection(InjectionSite {
                    consumed_type: entry.field_type.clone(),
                    variable_name: entry.name.clone(),
                    range: entry.range,
                    method: InjectionMethod::FieldAnnotation,
                    target_line: None,
                    qualifier: entry.qualifier.clone(),
                }));
                injected_here = true;
            }
        }

        if ctx.convention_constructor
            && !injected_here
            && contains_word(line.text, "final")
            && !contains_word(line.text, "static")
        {
            if let Some(entry) = line.field.and_then(|f| ctx.fields.get(f.name.text)) {
                emissions.push(Emission::Injection(InjectionSite {
                    consumed_type: entry.field_type.clone(),
                    variable_name: entry.name.clone(),
                    range: entry.range,
                    method: InjectionMethod::ConventionConstructor,
                    target_line: None,
                    qualifier: entry.qualifier.clone(),
                }));
            }
        }

        // A member declaration consumes markers that did not lead to a bean
        if !next.pending_bean_on_method && (line.field.is_some() || line.method.is_some()) {
            next.last_qualifier = None;
            next.pending_primary = false;
        }

        Step {
            state: next,
            emissions,
        }
    }

    fn track_factory_method(
        &mut self,
        line: &ClassifiedLine<'_>,
        line_no: u32,
        emissions: &mut Vec<Emission>,
    ) {
        let class_name = self.current_class.as_ref().map(|c| c.name.as_str());
        match line.method {
            Some(method) if Some(method.name.text) != class_name => {
                let range =
                    SourceRange::on_line(line_no, method.name.column, method.name.text.len());
                let bean = BeanDefinition::new(
                    method.name.text,
                    method.return_type.text,
                    range,
                    BeanOrigin::FactoryMethod,
                )
                .with_qualifier(self.last_qualifier.take())
                .with_primary(self.pending_primary);
                emissions.push(Emission::Bean(bean));
                self.clear_method_markers();
            }
            Some(_) => {}
            None if !line.is_annotation() && line.is_statement() => {
                crate::debug_event!(
                    "scanner",
                    "abandoned",
                    "factory marker without method before line {}",
                    line_no + 1
                );
                self.clear_method_markers();
            }
            None => {}
        }
    }

    fn clear_method_markers(&mut self) {
        self.pending_bean_on_method = false;
        self.last_qualifier = None;
        self.pending_primary = false;
    }

    fn read_constructor_line(
        &mut self,
        line: &ClassifiedLine<'_>,
        line_no: u32,
        ctx: &ScanContext<'_>,
        emissions: &mut Vec<Emission>,
    ) {
        let class_name = self
            .current_class
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or_default();

        for arg in constructor_arguments(line.text, class_name) {
            let site = match ctx.fields.get(arg.name.text) {
                // Land on the field so navigation points at the declaration
                Some(field) => InjectionSite {
                    consumed_type: arg.ty.text.to_string(),
                    variable_name: arg.name.text.to_string(),
                    range: field.range,
                    method: InjectionMethod::ConstructorMappedToField,
                    target_line: Some(field.declaration_line),
                    qualifier: field
                        .qualifier
                        .clone()
                        .or_else(|| arg.qualifier.map(str::to_string)),
                },
                None => InjectionSite {
                    consumed_type: arg.ty.text.to_string(),
                    variable_name: arg.name.text.to_string(),
                    range: SourceRange::on_line(line_no, arg.ty.column, arg.ty.text.len()),
                    method: InjectionMethod::ConstructorArgument,
                    target_line: None,
                    qualifier: arg.qualifier.map(str::to_string),
                },
            };
            emissions.push(Emission::Injection(site));
        }

        self.constructor_depth += paren_balance(line.text);
        if self.constructor_depth <= 0 && line.text.contains(')') {
            self.inside_annotated_constructor = false;
            self.constructor_depth = 0;
            self.last_qualifier = None;
            self.pending_primary = false;
        }
    }
}

/// Field declared under an injection annotation, skipping further annotation lines.
fn annotated_field_below<'a>(idx: usize, ctx: &ScanContext<'a>) -> Option<&'a str> {
    for &text in ctx.lines.iter().skip(idx + 1) {
        let trimmed = text.trim();
        if trimmed.is_empty() || line::is_comment(trimmed) {
            continue;
        }
        if let Some(field) = line::field_declaration(text) {
            return Some(field.name.text);
        }
        if !trimmed.starts_with('@') {
            return None;
        }
    }
    None
}

impl ScanOutput {
    fn absorb(&mut self, emissions: Vec<Emission>) {
        for emission in emissions {
            match emission {
                Emission::Bean(bean) => self.beans.push(bean),
                Emission::Injection(site) => self.injections.push(site),
                Emission::Class(class) => self.classes.push(class),
            }
        }
    }
}

/// Run the scanner over all lines of a document.
pub fn scan(ctx: &ScanContext<'_>) -> ScanOutput {
    let (_, output) = (0..ctx.lines.len()).fold(
        (ScanState::default(), ScanOutput::default()),
        |(state, mut output), idx| {
            let step = state.step(idx, ctx);
            output.absorb(step.emissions);
            (step.state, output)
        },
    );

    crate::debug_event!(
        "scanner",
        "scanned",
        "{} lines, {} beans, {} injections",
        ctx.lines.len(),
        output.beans.len(),
        output.injections.len()
    );
    output
}
