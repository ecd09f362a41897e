//! Line splitting helpers shared by the parser and the validator

pub(crate) const DELIMITER: char = ';';

/// Split `line` on `delimiter` unless the delimiter is nested inside `[` `]`.
///
/// Fields are trimmed, empty fields are dropped.
///
/// The bracket depth is a plain counter: a stray `]` makes it negative and the following delimiters split again only
/// once it is back at zero. This is accepted, the validator reports unbalanced header lines.
pub fn split_respecting_brackets(line: &str, delimiter: char) -> Vec<&str> {
    let mut fields = vec![];
    let mut depth: i32 = 0;
    let mut start = 0;

    for (index, c) in line.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth -= 1,
            _ if c == delimiter && depth == 0 => {
                push_trimmed(&mut fields, &line[start..index]);
                start = index + c.len_utf8();
            }
            _ => {}
        }
    }
    push_trimmed(&mut fields, &line[start..]);

    fields
}

fn push_trimmed<'a>(fields: &mut Vec<&'a str>, field: &'a str) {
    let field = field.trim();
    if !field.is_empty() {
        fields.push(field);
    }
}

/// Split a data row on the raw delimiter. Empty fields are kept, their position matters.
pub(crate) fn split_row(line: &str) -> Vec<String> {
    line.split(DELIMITER)
        .map(|field| field.trim().to_string())
        .collect()
}

/// Remove one surrounding `[` `]` pair, if there is one
pub(crate) fn strip_brackets(fragment: &str) -> &str {
    let fragment = fragment.trim();
    fragment
        .strip_prefix('[')
        .and_then(|inner| inner.strip_suffix(']'))
        .unwrap_or(fragment)
}

pub(crate) fn is_bracketed(fragment: &str) -> bool {
    fragment.len() >= 2 && fragment.starts_with('[') && fragment.ends_with(']')
}

/// Inner text of a `"quoted"` fragment
pub(crate) fn unquote(fragment: &str) -> Option<&str> {
    if fragment.len() < 2 {
        return None;
    }

    fragment
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
}

/// Name of a `[concat=Name]` header token, case insensitive on the `concat` keyword
pub(crate) fn concat_name(token: &str) -> Option<&str> {
    const PREFIX: &str = "[concat=";

    let head = token.get(..PREFIX.len())?;
    if !head.eq_ignore_ascii_case(PREFIX) {
        return None;
    }

    let name = &token[PREFIX.len()..];
    Some(name.strip_suffix(']').unwrap_or(name).trim())
}

pub(crate) fn is_comment_or_blank(line: &str) -> bool {
    line.is_empty() || line.starts_with('#')
}
