use std::borrow::Cow;

use anyhow::{Context, Result};
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricLabel {
    pub name: String,
    pub unit: Option<String>,
}

/// Splits labels such as `Revenue (USD millions)` into a display name and
/// a unit annotation.
#[derive(Debug)]
pub struct MetricNameParser {
    annotation_regex: Regex,
    unit_regex: Regex,
}

impl MetricNameParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            annotation_regex: Regex::new(r"\s*\([^)]*\)\s*")
                .context("failed to compile metric annotation regex")?,
            unit_regex: Regex::new(r"\(([^)]+)\)").context("failed to compile metric unit regex")?,
        })
    }

    pub fn parse(&self, raw: &str) -> MetricLabel {
        let unit = self.extract_unit(raw);
        MetricLabel {
            name: self.clean_metric_name(raw).into_owned(),
            unit: (!unit.is_empty()).then(|| unit.to_string()),
        }
    }

    /// Every parenthesised group is removed; the fragments around a group
    /// are joined by a single space. Labels without a group are returned
    /// untouched.
    pub fn clean_metric_name<'a>(&self, raw: &'a str) -> Cow<'a, str> {
        if !self.annotation_regex.is_match(raw) {
            return Cow::Borrowed(raw);
        }

        let replaced = self.annotation_regex.replace_all(raw, " ");
        Cow::Owned(replaced.trim().to_string())
    }

    /// Content of the first parenthesised group, or `""`.
    pub fn extract_unit<'a>(&self, raw: &'a str) -> &'a str {
        self.unit_regex
            .captures(raw)
            .and_then(|captures| captures.get(1))
            .map_or("", |unit| unit.as_str())
    }
}
