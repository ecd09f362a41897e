//! Strict check of a text resource before it is written
//!
//! The parser accepts anything, the validator does not. It runs in two passes over the same lines:
//! 1. collect every name defined by a section header or a concat header
//! 2. check each line: bracket balance, concat parts and references, column types, attributes and row width
//!
//! Line numbers in [Issue]s are 1-indexed.
use crate::column::{ColumnType, ATTRIBUTES, BOOLEAN_TOKENS};
use crate::util::{
    concat_name, is_bracketed, is_comment_or_blank, split_respecting_brackets, strip_brackets,
    unquote, DELIMITER,
};
use std::collections::HashSet;

/// Validate `text`, collecting every issue rather than stopping at the first
pub fn validate(text: &str) -> Result<(), ValidationErrors> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let defined_names = harvest_names(&lines);

    let mut e = ValidationErrors::new();
    // column count of the active section, rows outside of sections are not checked
    let mut active_columns: Option<usize> = None;

    for (index, line) in lines.iter().enumerate() {
        let line_number = index + 1;
        if is_comment_or_blank(line) {
            continue;
        }

        if !line.starts_with('[') {
            if let Some(expected) = active_columns {
                let found = line.split(DELIMITER).count();
                if found > expected {
                    e.log(Issue::TooManyValues {
                        line: line_number,
                        expected,
                        found,
                    });
                }
            }
            continue;
        }

        if line.matches('[').count() != line.matches(']').count() {
            e.log(Issue::UnbalancedBrackets { line: line_number });
            continue;
        }

        let tokens = split_respecting_brackets(line, DELIMITER);
        let Some(first) = tokens.first() else {
            continue;
        };

        if concat_name(first).is_some() {
            check_concat(line_number, &tokens[1..], &defined_names, &mut e);
            active_columns = None;
            continue;
        }

        for token in &tokens {
            check_column(line_number, token, &mut e);
        }
        active_columns = Some(tokens.len());
    }

    if e.issues.is_empty() {
        Ok(())
    } else {
        Err(e)
    }
}

/// Pass 1: names of all columns and concatenations, whether or not their definitions are valid
fn harvest_names(lines: &[&str]) -> HashSet<String> {
    let mut names = HashSet::new();

    for line in lines {
        if is_comment_or_blank(line) || !line.starts_with('[') {
            continue;
        }

        let tokens = split_respecting_brackets(line, DELIMITER);
        let Some(first) = tokens.first() else {
            continue;
        };

        if let Some(name) = concat_name(first) {
            names.insert(name.to_string());
            continue;
        }

        for token in &tokens {
            let definition = strip_brackets(token).split(DELIMITER).next().unwrap_or_default();
            let name = definition.split('=').next().unwrap_or_default().trim();
            names.insert(name.to_string());
        }
    }

    names
}

fn check_concat(
    line: usize,
    parts: &[&str],
    defined_names: &HashSet<String>,
    e: &mut ValidationErrors,
) {
    for part in parts {
        if is_bracketed(part) {
            let reference = strip_brackets(part).trim();
            if !defined_names.contains(reference) {
                e.log(Issue::UnknownReference {
                    line,
                    reference: reference.to_string(),
                });
            }
        } else if unquote(part).is_none() {
            e.log(Issue::InvalidConcatPart {
                line,
                part: part.to_string(),
            });
        }
    }
}

fn check_column(line: usize, token: &str, e: &mut ValidationErrors) {
    let mut parts = strip_brackets(token)
        .split(DELIMITER)
        .map(str::trim)
        .filter(|part| !part.is_empty());

    let Some(definition) = parts.next() else {
        e.log(Issue::EmptyColumn { line });
        return;
    };

    if let Some((_, type_token)) = definition.split_once('=') {
        if ColumnType::from_token(type_token).is_none() {
            e.log(Issue::InvalidType {
                line,
                found: type_token.trim().to_lowercase(),
            });
        }
    }

    for attribute in parts {
        let Some((key, value)) = attribute.split_once('=') else {
            e.log(Issue::InvalidAttributeFormat {
                line,
                attribute: attribute.to_string(),
            });
            continue;
        };

        let key = key.trim().to_lowercase();
        let value = value.trim().to_lowercase();

        if !ATTRIBUTES.contains(&key.as_str()) {
            e.log(Issue::UnknownAttribute { line, key });
        } else if key == "output" && !BOOLEAN_TOKENS.contains(&value.as_str()) {
            e.log(Issue::InvalidBoolean { line, value });
        }
    }
}

#[derive(derive_new::new, Debug, PartialEq)]
pub struct ValidationErrors {
    #[new(default)]
    issues: Vec<Issue>,
}

impl ValidationErrors {
    pub fn log(&mut self, issue: Issue) {
        tracing::trace!(?issue, "issue found");
        self.issues.push(issue);
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// One message per issue, in line order
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }
}

impl std::error::Error for ValidationErrors {}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.messages().join("\n"))
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Issue {
    #[error("Line {line}: Unbalanced brackets.")]
    UnbalancedBrackets { line: usize },
    #[error("Line {line}: Unknown reference '{reference}' in concat.")]
    UnknownReference { line: usize, reference: String },
    #[error("Line {line}: Invalid concat part '{part}'. Must be [Ref] or \"Text\".")]
    InvalidConcatPart { line: usize, part: String },
    #[error("Line {line}: Empty column definition.")]
    EmptyColumn { line: usize },
    #[error("Line {line}: Invalid type '{found}'. Valid: string, int, float, bool, textbox")]
    InvalidType { line: usize, found: String },
    #[error("Line {line}: Invalid attribute format '{attribute}'. Use key=value.")]
    InvalidAttributeFormat { line: usize, attribute: String },
    #[error("Line {line}: Unknown attribute '{key}'.")]
    UnknownAttribute { line: usize, key: String },
    #[error("Line {line}: Invalid boolean '{value}' for output.")]
    InvalidBoolean { line: usize, value: String },
    #[error("Line {line}: Too many values. Expected {expected}, found {found}.")]
    TooManyValues {
        line: usize,
        expected: usize,
        found: usize,
    },
}
