//! Text patching for case files
//!
//! Two kinds of edits are supported:
//! - Key updates rewrite the value of the first `key  value;` line and keep
//!   the indentation, the `;` and any trailing comment
//! - Regex updates substitute every match of a pattern with a replacement
//!   whose `{name}` placeholders are filled from the current row
//!
//! A key that is not found is an error. A regex that matches nothing is not.

use crate::error::{Error, Result};
use crate::mapping::Update;
use crate::table::Row;
use regex::{Regex, RegexBuilder};
use std::collections::BTreeMap;
use std::path::Path;

/// Replace the value of the first `key value;` entry in `text`.
///
/// The key is matched literally. Leading whitespace, the whitespace before
/// `;` and the rest of the line are kept as they are.
pub fn set_key(text: &str, key: &str, value: &str) -> Result<String> {
    let pattern = format!(r"^(\s*{}\s+)(.*?)(\s*;)([^\r\n]*)$", regex::escape(key));
    let re = RegexBuilder::new(&pattern)
        .multi_line(true)
        .crlf(true)
        .build()
        .map_err(|e| Error::InvalidPattern {
            pattern: pattern.clone(),
            source: e,
        })?;

    let caps = re.captures(text).ok_or_else(|| Error::KeyNotFound {
        key: key.to_string(),
    })?;
    // Group 2 always participates, even when the old value is empty
    let old = caps.get(2).ok_or_else(|| Error::KeyNotFound {
        key: key.to_string(),
    })?;

    let mut out = String::with_capacity(text.len() + value.len());
    out.push_str(&text[..old.start()]);
    out.push_str(value);
    out.push_str(&text[old.end()..]);
    Ok(out)
}

/// Apply a templated regex substitution to every match in `text`.
///
/// `params` maps placeholder names used in `replacement` to row columns.
/// All referenced columns must exist in the row, whether or not the pattern
/// matches anything.
pub fn apply_regex(
    text: &str,
    pattern: &str,
    replacement: &str,
    params: &BTreeMap<String, String>,
    row: &Row,
) -> Result<String> {
    let mut values = BTreeMap::new();
    for (placeholder, column) in params {
        let value = row
            .get(column)
            .ok_or_else(|| Error::MissingColumnForRegexParam {
                column: column.clone(),
                placeholder: placeholder.clone(),
            })?;
        values.insert(placeholder.as_str(), value);
    }

    let filled = fill_template(replacement, &values)?;

    let re = RegexBuilder::new(pattern)
        .multi_line(true)
        .build()
        .map_err(|e| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source: e,
        })?;
    let expanded = expand_replacement(&filled, &re)?;

    Ok(re.replace_all(text, expanded.as_str()).into_owned())
}

/// Apply one mapping update to a file's text
pub fn apply_update(text: &str, update: &Update, row: &Row, file: &Path) -> Result<String> {
    match update {
        Update::Key { key, param } => {
            let value = row
                .get(param)
                .ok_or_else(|| Error::ColumnMissingForKeyUpdate {
                    column: param.clone(),
                    key: key.clone(),
                    path: file.to_path_buf(),
                })?;
            tracing::debug!("  - set key {} = {}", key, value);
            set_key(text, key, value)
        }
        Update::Regex {
            pattern,
            replacement,
            params,
        } => {
            tracing::debug!("  - regex {} -> {}", pattern, replacement);
            apply_regex(text, pattern, replacement, params, row)
        }
        Update::Unknown(kind) => Err(Error::UnknownUpdateType(kind.clone())),
        Update::Malformed(reason) => Err(Error::MalformedMapping(reason.clone())),
    }
}

/// Fill `{name}` placeholders. `{{` and `}}` produce literal braces.
pub fn fill_template(template: &str, values: &BTreeMap<&str, &str>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix("{{") {
            out.push('{');
            rest = after;
        } else if let Some(after) = tail.strip_prefix("}}") {
            out.push('}');
            rest = after;
        } else if tail.starts_with('}') {
            return Err(malformed(template, "single '}' encountered"));
        } else {
            let end = tail
                .find('}')
                .ok_or_else(|| malformed(template, "unmatched '{'"))?;
            let name = &tail[1..end];
            if name.contains('{') {
                return Err(malformed(template, "unexpected '{' in field name"));
            }
            let value = values
                .get(name)
                .ok_or_else(|| Error::MissingPlaceholderInReplacement(name.to_string()))?;
            out.push_str(value);
            rest = &tail[end + 1..];
        }
    }

    out.push_str(rest);
    Ok(out)
}

/// Translate backslash replacement syntax into the `regex` crate's syntax.
///
/// `\1`..`\99`, `\g<N>` and `\g<name>` become group references, checked
/// against the groups of `re`. `\0` with up to two more octal digits, or any
/// three octal digits, is an octal character code. `$` is made literal.
fn expand_replacement(replacement: &str, re: &Regex) -> Result<String> {
    let mut out = String::with_capacity(replacement.len() + 8);
    let mut chars = replacement.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '$' => out.push_str("$$"),
            '\\' => {
                let Some(esc) = chars.next() else {
                    return Err(malformed(replacement, "trailing backslash"));
                };
                match esc {
                    '0' => {
                        let mut digits = String::from("0");
                        while digits.len() < 3 {
                            match chars.peek() {
                                Some(&d) if is_octal(d) => {
                                    digits.push(d);
                                    chars.next();
                                }
                                _ => break,
                            }
                        }
                        push_octal(&mut out, &digits, replacement)?;
                    }
                    '1'..='9' => {
                        let mut digits = esc.to_string();
                        if let Some(&d) = chars.peek() {
                            if d.is_ascii_digit() {
                                digits.push(d);
                                chars.next();
                            }
                        }
                        // Three octal digits are a character, not a group
                        let third = chars.peek().copied().filter(|&d| is_octal(d));
                        match third {
                            Some(d) if digits.len() == 2 && digits.chars().all(is_octal) => {
                                digits.push(d);
                                chars.next();
                                push_octal(&mut out, &digits, replacement)?;
                            }
                            _ => push_group(&mut out, &digits, replacement, re)?,
                        }
                    }
                    'g' => {
                        if chars.next() != Some('<') {
                            return Err(malformed(replacement, "missing '<' after \\g"));
                        }
                        let mut group = String::new();
                        loop {
                            match chars.next() {
                                Some('>') => break,
                                Some(ch) => group.push(ch),
                                None => return Err(malformed(replacement, "missing '>' after \\g<")),
                            }
                        }
                        if group.is_empty() {
                            return Err(malformed(replacement, "empty group name"));
                        }
                        push_group(&mut out, &group, replacement, re)?;
                    }
                    '\\' => out.push('\\'),
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    'f' => out.push('\x0c'),
                    'v' => out.push('\x0b'),
                    'a' => out.push('\x07'),
                    'b' => out.push('\x08'),
                    other if other.is_ascii_alphabetic() => {
                        return Err(malformed(replacement, &format!("bad escape \\{}", other)));
                    }
                    '$' => out.push_str("\\$$"),
                    other => {
                        out.push('\\');
                        out.push(other);
                    }
                }
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

fn is_octal(c: char) -> bool {
    matches!(c, '0'..='7')
}

/// Push the character for an octal escape; codes above 0o377 are rejected
fn push_octal(out: &mut String, digits: &str, replacement: &str) -> Result<()> {
    match u32::from_str_radix(digits, 8).ok().filter(|&v| v <= 0o377) {
        Some(code) => {
            match char::from_u32(code) {
                Some('$') => out.push_str("$$"),
                Some(ch) => out.push(ch),
                None => {}
            }
            Ok(())
        }
        None => Err(malformed(
            replacement,
            &format!("octal escape value \\{} outside of range 0-0o377", digits),
        )),
    }
}

fn push_group(out: &mut String, group: &str, replacement: &str, re: &Regex) -> Result<()> {
    let known = match group.parse::<usize>() {
        Ok(index) => index < re.captures_len(),
        Err(_) => re.capture_names().flatten().any(|n| n == group),
    };
    if !known {
        return Err(malformed(
            replacement,
            &format!("invalid group reference {}", group),
        ));
    }
    out.push_str("${");
    out.push_str(group);
    out.push('}');
    Ok(())
}

fn malformed(replacement: &str, message: &str) -> Error {
    Error::MalformedReplacement {
        replacement: replacement.to_string(),
        message: message.to_string(),
    }
}
