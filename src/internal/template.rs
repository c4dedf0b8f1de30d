//! Replacement templates, parsed once per substitution.
//!
//! Syntax: `$N`, `${N}`, `$name`, `${name}`, and `$$` for a literal `$`.
//! A `$` that does not start a reference is kept as is.

use crate::Error;
use regex::{Captures, Regex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Literal(String),
    Group(usize),
}

#[derive(Debug, Clone)]
pub(crate) struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parse `replacement`, resolving every group reference against `regex`
    pub(crate) fn parse(replacement: &str, regex: &Regex) -> Result<Self, Error> {
        let mut segments = Vec::new();
        let mut rest = replacement;

        while let Some(pos) = rest.find('$') {
            push_literal(&mut segments, &rest[..pos]);
            let after = &rest[pos + 1..];

            if let Some(tail) = after.strip_prefix('$') {
                push_literal(&mut segments, "$");
                rest = tail;
                continue;
            }

            let (name, tail) = if let Some(braced) = after.strip_prefix('{') {
                match braced.find('}') {
                    Some(end) if end > 0 => (&braced[..end], &braced[end + 1..]),
                    _ => ("", after),
                }
            } else if after.starts_with(|c: char| c.is_ascii_digit()) {
                // Names never start with a digit, so `$1x` is group 1 then "x"
                let end = after
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(after.len());
                (&after[..end], &after[end..])
            } else {
                let end = after
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .unwrap_or(after.len());
                (&after[..end], &after[end..])
            };

            if name.is_empty() {
                push_literal(&mut segments, "$");
            } else {
                segments.push(Segment::Group(resolve(name, replacement, regex)?));
            }
            rest = tail;
        }
        push_literal(&mut segments, rest);

        Ok(Self { segments })
    }

    /// Length of this template expanded against one match
    pub(crate) fn expanded_len(&self, caps: &Captures<'_>) -> usize {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.len(),
                Segment::Group(index) => caps.get(*index).map_or(0, |m| m.len()),
            })
            .sum()
    }

    /// Append this template expanded against one match to `out`
    pub(crate) fn expand_into(&self, caps: &Captures<'_>, out: &mut String) {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Group(index) => {
                    if let Some(m) = caps.get(*index) {
                        out.push_str(m.as_str());
                    }
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

fn push_literal(segments: &mut Vec<Segment>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Segment::Literal(last)) = segments.last_mut() {
        last.push_str(text);
    } else {
        segments.push(Segment::Literal(text.to_string()));
    }
}

fn resolve(name: &str, replacement: &str, regex: &Regex) -> Result<usize, Error> {
    let invalid = |reason: String| Error::InvalidReplacement {
        replacement: replacement.to_string(),
        reason,
    };

    if name.bytes().all(|b| b.is_ascii_digit()) {
        let index: usize = name
            .parse()
            .map_err(|_| invalid(format!("group number {name} is too large")))?;
        if index >= regex.captures_len() {
            return Err(invalid(format!(
                "group {index} does not exist, the pattern has {} group(s)",
                regex.captures_len() - 1
            )));
        }
        return Ok(index);
    }

    regex
        .capture_names()
        .position(|candidate| candidate == Some(name))
        .ok_or_else(|| invalid(format!("no group named {name}")))
}
