use std::collections::HashMap;
use anyhow::{anyhow, Result};

/// Field names understood by `planit add`.
pub const ADD_FIELDS: &[&str] = &["start", "end", "for", "date"];

#[derive(Debug, PartialEq)]
pub struct ParsedInput {
    pub title: String,
    pub fields: HashMap<String, String>,
}

/// Splits free words (the title) from `key:value` fields.
///
/// Only words whose key is alphabetic count as fields, so a title word like
/// `10:30` or `re:` stays part of the title.
pub fn parse_args(args: &[String]) -> ParsedInput {
    let mut title_parts = Vec::new();
    let mut fields = HashMap::new();

    for arg in args {
        if let Some((key, value)) = arg.split_once(':') {
            if !key.is_empty() && !value.is_empty() && key.chars().all(|c| c.is_ascii_alphabetic()) {
                fields.insert(key.to_lowercase(), value.to_string());
                continue;
            }
        }
        title_parts.push(arg.as_str());
    }

    ParsedInput {
        title: title_parts.join(" "),
        fields,
    }
}

pub fn expand_key(key: &str, candidates: &[&str]) -> Result<String> {
    if candidates.contains(&key) {
        return Ok(key.to_string());
    }

    let matches: Vec<&str> = candidates
        .iter()
        .filter(|&&c| c.starts_with(key))
        .cloned()
        .collect();

    match matches.len() {
        1 => Ok(matches[0].to_string()),
        0 => Err(anyhow!("Unknown field: '{}'", key)),
        _ => Err(anyhow!("Ambiguous field: '{}' matches {:?}", key, matches)),
    }
}
