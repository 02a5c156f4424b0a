//! Default descriptions derived from standard names.
//!
//! Standard names are snake_case identifiers that spell decimal points as
//! `p` between two digits (`0p55` for `0.55`). The default description
//! capitalizes the name, turns underscores into spaces and restores those
//! decimal points.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::domain::{Entry, SourceLocation};

/// A `p` with a digit on both sides. Greedy, so the rightmost one matches first.
static REAL_SUBST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*\d)p(\d.*)").expect("valid decimal point regex"));

/// Raised when a description is needed but there is no standard name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "No standard name to convert{} to description{}",
    fallback_segment(.fallback),
    location_segment(.location)
)]
pub struct NoNameToDescribeError {
    /// Some other identifier for the thing being described
    pub fallback: Option<String>,

    /// Where the nameless item came from
    pub location: Option<SourceLocation>,
}

fn fallback_segment(fallback: &Option<String>) -> String {
    fallback
        .as_ref()
        .map(|name| format!(" {}", name))
        .unwrap_or_default()
}

fn location_segment(location: &Option<SourceLocation>) -> String {
    location
        .as_ref()
        .map(|loc| format!(" at {}", loc))
        .unwrap_or_default()
}

/// Names available to describe an item
#[derive(Debug, Clone, Copy, Default)]
pub struct NameSource<'a> {
    pub standard_name: Option<&'a str>,

    /// Only used to make the error message more helpful
    pub local_name: Option<&'a str>,
}

/// Turn a standard name into its default description.
///
/// `cloud_optical_depth_layers_from_0p55mu_to_0p99mu` becomes
/// `Cloud optical depth layers from 0.55mu to 0.99mu`.
pub fn synthesize(name: &str) -> String {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut description: String = first.to_uppercase().collect();
    description.push_str(&chars.as_str().replace('_', " "));

    loop {
        let next = match REAL_SUBST_RE.captures(&description) {
            Some(caps) => {
                let end = caps.get(0).map_or(description.len(), |m| m.end());
                format!("{}.{}{}", &caps[1], &caps[2], &description[end..])
            }
            None => break,
        };
        description = next;
    }

    description
}

/// Describe an item from whatever names it has.
///
/// Fails when there is no standard name at all; an empty standard name
/// yields an empty description.
pub fn describe(
    source: NameSource<'_>,
    location: Option<&SourceLocation>,
) -> Result<String, NoNameToDescribeError> {
    match source.standard_name {
        Some(name) => Ok(synthesize(name)),
        None => Err(NoNameToDescribeError {
            fallback: source.local_name.map(str::to_string),
            location: location.cloned(),
        }),
    }
}

impl Entry {
    /// The entry's description, synthesized from its name when absent
    pub fn resolved_description(&self) -> Result<Cow<'_, str>, NoNameToDescribeError> {
        if let Some(description) = self.description() {
            return Ok(Cow::Borrowed(description));
        }

        let source = NameSource {
            standard_name: self.name(),
            local_name: None,
        };
        describe(source, self.location.as_ref()).map(Cow::Owned)
    }
}
