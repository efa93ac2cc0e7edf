//! Line classifier.
//!
//! Small predicates and extractors over a single physical line. Every function
//! here is pure; the scanner composes them rule by rule.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::config::AnalysisConfig;

static QUALIFIER_RE: OnceLock<Regex> = OnceLock::new();
static CLASS_RE: OnceLock<Regex> = OnceLock::new();
static FIELD_RE: OnceLock<Regex> = OnceLock::new();
static METHOD_RE: OnceLock<Regex> = OnceLock::new();
static ARGUMENT_RE: OnceLock<Regex> = OnceLock::new();
static BUILTIN_TYPES: OnceLock<HashSet<&'static str>> = OnceLock::new();

const QUALIFIER_MARKER: &str = "@Qualifier";

fn qualifier_re() -> &'static Regex {
    QUALIFIER_RE.get_or_init(|| {
        Regex::new(r#"@Qualifier\s*\(\s*"([^"]+)"\s*\)"#).expect("qualifier pattern is valid")
    })
}

fn class_re() -> &'static Regex {
    CLASS_RE.get_or_init(|| {
        Regex::new(r"\b(?:class|interface)\s+(\w+)").expect("class pattern is valid")
    })
}

fn field_re() -> &'static Regex {
    FIELD_RE.get_or_init(|| {
        Regex::new(r"(?:private|protected|public)?\s+(?:final\s+)?([\w<>]+)\s+(\w+)\s*;")
            .expect("field pattern is valid")
    })
}

fn method_re() -> &'static Regex {
    METHOD_RE.get_or_init(|| {
        Regex::new(
            r"^\s*(?:(?:public|protected|private|static|final|synchronized)\s+)*([\w<>\[\].]+)\s+(\w+)\s*\(",
        )
        .expect("method pattern is valid")
    })
}

fn argument_re() -> &'static Regex {
    ARGUMENT_RE.get_or_init(|| {
        Regex::new(r"\b([A-Z][\w<>]*)\s+(\w+)\b").expect("argument pattern is valid")
    })
}

/// Types never treated as injectable constructor arguments.
fn builtin_types() -> &'static HashSet<&'static str> {
    BUILTIN_TYPES.get_or_init(|| {
        [
            "String", "Integer", "Long", "Short", "Byte", "Float", "Double", "Boolean",
            "Character", "Object", "int", "long", "short", "byte", "float", "double", "boolean",
            "char",
        ]
        .into_iter()
        .collect()
    })
}

/// Words a statement can start with that the field pattern would read as a type.
const NON_TYPE_KEYWORDS: &[&str] = &["return", "class", "throw", "new", "package", "import"];

/// An identifier matched on a line, with its byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub column: usize,
}

impl Token<'_> {
    pub fn end(&self) -> usize {
        self.column + self.text.len()
    }
}

/// `Type name;` shaped declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDecl<'a> {
    pub ty: Token<'a>,
    pub name: Token<'a>,
}

/// `ReturnType name(` shaped declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodDecl<'a> {
    pub return_type: Token<'a>,
    pub name: Token<'a>,
}

/// `Type name` shaped parameter inside a constructor signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentToken<'a> {
    pub ty: Token<'a>,
    pub name: Token<'a>,
    /// Qualifier literal written on this parameter, if any.
    pub qualifier: Option<&'a str>,
}

/// Blank lines and lines opening with a comment marker carry no declarations.
pub fn is_skippable(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || is_comment(trimmed)
}

pub fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*')
}

/// First `@Qualifier("...")` literal on the line, quotes stripped.
pub fn qualifier_literal(text: &str) -> Option<&str> {
    qualifier_re()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Whether the text mentions a qualifier at all, well-formed or not.
pub fn has_qualifier_marker(text: &str) -> bool {
    text.contains(QUALIFIER_MARKER)
}

/// Name of a `class` or `interface` declared on the line.
pub fn class_declaration(line: &str) -> Option<Token<'_>> {
    let name = class_re().captures(line)?.get(1)?;
    Some(Token {
        text: name.as_str(),
        column: name.start(),
    })
}

/// Field declaration on the line, rejecting statements such as `return x;`.
pub fn field_declaration(line: &str) -> Option<FieldDecl<'_>> {
    let caps = field_re().captures(line)?;
    let ty = caps.get(1)?;
    let name = caps.get(2)?;
    if NON_TYPE_KEYWORDS.contains(&ty.as_str()) {
        return None;
    }
    Some(FieldDecl {
        ty: Token {
            text: ty.as_str(),
            column: ty.start(),
        },
        name: Token {
            text: name.as_str(),
            column: name.start(),
        },
    })
}

/// Method declaration at the start of the line.
pub fn method_declaration(line: &str) -> Option<MethodDecl<'_>> {
    let caps = method_re().captures(line)?;
    let return_type = caps.get(1)?;
    let name = caps.get(2)?;
    if NON_TYPE_KEYWORDS.contains(&return_type.as_str()) {
        return None;
    }
    Some(MethodDecl {
        return_type: Token {
            text: return_type.as_str(),
            column: return_type.start(),
        },
        name: Token {
            text: name.as_str(),
            column: name.start(),
        },
    })
}

/// Whether the line declares a constructor of `class_name`.
///
/// Matches `ClassName(` preceded by a word boundary, skipping `new ClassName(`.
pub fn declares_constructor(line: &str, class_name: &str) -> bool {
    if class_name.is_empty() {
        return false;
    }
    line.match_indices(class_name).any(|(idx, _)| {
        let before = &line[..idx];
        let after = line[idx + class_name.len()..].trim_start();
        let boundary = before
            .chars()
            .next_back()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_' || c == '.'));
        let instantiation = before.trim_end().ends_with("new");
        boundary && !instantiation && after.starts_with('(')
    })
}

/// Candidate injectable parameters on a constructor signature line.
///
/// Annotation names, the enclosing class and built-in types are skipped. Each
/// parameter carries the qualifier literal written between it and the
/// previous parameter separator.
pub fn constructor_arguments<'a>(line: &'a str, class_name: &str) -> Vec<ArgumentToken<'a>> {
    let mut arguments = Vec::new();
    let mut segment_start = 0;

    for caps in argument_re().captures_iter(line) {
        let (Some(ty), Some(name)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        if line[..ty.start()].ends_with('@') {
            continue;
        }
        if ty.as_str() == class_name || builtin_types().contains(ty.as_str()) {
            segment_start = name.end();
            continue;
        }

        let prefix = &line[segment_start..ty.start()];
        let qualifier = qualifier_literal(&prefix[parameter_start(prefix)..]);

        arguments.push(ArgumentToken {
            ty: Token {
                text: ty.as_str(),
                column: ty.start(),
            },
            name: Token {
                text: name.as_str(),
                column: name.start(),
            },
            qualifier,
        });
        segment_start = name.end();
    }

    arguments
}

/// Byte offset just past the last top-level `(` or `,` in `prefix`.
///
/// Parentheses belonging to annotation arguments are balanced out so that
/// `(@Qualifier("a") ` yields the offset of `@`.
fn parameter_start(prefix: &str) -> usize {
    let mut depth = 0;
    for (idx, c) in prefix.char_indices().rev() {
        match c {
            ')' => depth += 1,
            '(' if depth > 0 => depth -= 1,
            '(' | ',' if depth == 0 => return idx + 1,
            _ => {}
        }
    }
    0
}

/// Net parenthesis depth change of the line.
pub fn paren_balance(line: &str) -> i32 {
    line.chars().fold(0, |depth, c| match c {
        '(' => depth + 1,
        ')' => depth - 1,
        _ => depth,
    })
}

/// Whether `text` contains the word `word` (identifier boundaries on both sides).
pub fn contains_word(text: &str, word: &str) -> bool {
    text.match_indices(word).any(|(idx, _)| {
        let before_ok = text[..idx]
            .chars()
            .next_back()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_'));
        let after_ok = text[idx + word.len()..]
            .chars()
            .next()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_'));
        before_ok && after_ok
    })
}

/// Annotation vocabulary recognised by the scanner and filters.
#[derive(Debug, Clone)]
pub struct Dialect {
    stereotype: Vec<String>,
    factory: Vec<String>,
    primary: Vec<String>,
    injection: Vec<String>,
    usage_injection: Vec<String>,
    convention_constructor: Vec<String>,
}

impl Dialect {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            stereotype: config.stereotype_annotations.clone(),
            factory: config.factory_annotations.clone(),
            primary: config.primary_annotations.clone(),
            injection: config.injection_annotations.clone(),
            usage_injection: config.usage_injection_annotations.clone(),
            convention_constructor: config.convention_constructor_annotations.clone(),
        }
    }

    pub fn is_stereotype(&self, text: &str) -> bool {
        has_annotation(text, &self.stereotype)
    }

    pub fn is_factory(&self, text: &str) -> bool {
        has_annotation(text, &self.factory)
    }

    pub fn is_primary(&self, text: &str) -> bool {
        has_annotation(text, &self.primary)
    }

    pub fn is_injection(&self, text: &str) -> bool {
        has_annotation(text, &self.injection)
    }

    pub fn is_usage_injection(&self, text: &str) -> bool {
        has_annotation(text, &self.usage_injection)
    }

    pub fn is_convention_constructor(&self, text: &str) -> bool {
        has_annotation(text, &self.convention_constructor)
    }

    /// Trimmed line opens with a factory annotation.
    pub fn starts_with_factory(&self, trimmed: &str) -> bool {
        starts_with_annotation(trimmed, &self.factory)
    }

    /// Trimmed line opens with a primary annotation.
    pub fn starts_with_primary(&self, trimmed: &str) -> bool {
        starts_with_annotation(trimmed, &self.primary)
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

/// `@Name` followed by a non-identifier character or end of text.
fn has_annotation(text: &str, names: &[String]) -> bool {
    names.iter().any(|name| {
        let marker = format!("@{name}");
        text.match_indices(&marker).any(|(idx, _)| {
            text[idx + marker.len()..]
                .chars()
                .next()
                .is_none_or(|c| !(c.is_alphanumeric() || c == '_'))
        })
    })
}

fn starts_with_annotation(trimmed: &str, names: &[String]) -> bool {
    trimmed.starts_with('@') && has_annotation(trimmed.split_whitespace().next().unwrap_or(""), names)
}

/// Everything the scanner needs to know about one line, computed once.
#[derive(Debug, Clone)]
pub struct ClassifiedLine<'a> {
    pub text: &'a str,
    pub trimmed: &'a str,
    pub qualifier: Option<&'a str>,
    pub primary: bool,
    pub stereotype: bool,
    pub factory: bool,
    pub injection: bool,
    pub class_decl: Option<Token<'a>>,
    pub field: Option<FieldDecl<'a>>,
    pub method: Option<MethodDecl<'a>>,
}

impl<'a> ClassifiedLine<'a> {
    /// Classify a line, or `None` for blank and comment lines.
    pub fn classify(text: &'a str, dialect: &Dialect) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() || is_comment(trimmed) {
            return None;
        }
        let method = method_declaration(text);
        // Qualifiers on method parameters belong to the parameters
        let head = method.map_or(text, |m| &text[..m.name.end()]);
        Some(Self {
            text,
            trimmed,
            qualifier: qualifier_literal(head),
            primary: dialect.is_primary(text),
            stereotype: dialect.is_stereotype(text),
            factory: dialect.is_factory(text),
            injection: dialect.is_injection(text),
            class_decl: class_declaration(text),
            field: field_declaration(text),
            method,
        })
    }

    /// Line consists of annotations only.
    pub fn is_annotation(&self) -> bool {
        self.trimmed.starts_with('@')
    }

    /// Line terminates a statement or assigns.
    pub fn is_statement(&self) -> bool {
        self.text.contains('=') || self.text.contains(';')
    }
}
