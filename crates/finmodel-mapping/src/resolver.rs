//! Layered field-name resolution.
//!
//! For each catalog entry the resolver tries, in order: exact candidate
//! match, ASCII case-insensitive candidate match, keyword partial match.
//! The first layer that finds a field wins. Values are never inspected.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use finmodel_core::RawStatement;

use crate::catalog::{LineItem, LineItemCatalog};
use crate::keywords;

/// Note attached to line items the provider does not report.
pub const NOT_REPORTED: &str = "not reported by provider";

/// Default keyword share (percent) a raw field must reach to qualify.
pub const DEFAULT_MIN_KEYWORD_SHARE: u32 = 60;

/// How a line item was matched to a raw field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// A candidate name was present verbatim.
    Exact,
    /// A candidate name matched ignoring ASCII case.
    CaseInsensitive,
    /// Enough keyword tokens occurred in a raw field name.
    KeywordPartial,
    /// Nothing matched.
    Unavailable,
}

impl MatchStrategy {
    /// Returns the strategy as a snake_case string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::CaseInsensitive => "case_insensitive",
            Self::KeywordPartial => "keyword_partial",
            Self::Unavailable => "unavailable",
        }
    }

    /// Returns the confidence implied by this strategy.
    #[must_use]
    pub fn confidence(&self) -> Confidence {
        match self {
            Self::Exact | Self::CaseInsensitive => Confidence::High,
            Self::KeywordPartial => Confidence::Medium,
            Self::Unavailable => Confidence::None,
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Confidence in a resolved value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// No value.
    None,
    /// Keyword match.
    Medium,
    /// Exact or case-insensitive match.
    High,
}

impl Confidence {
    /// Returns the confidence as a snake_case string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::None => "none",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolution of one catalog line item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldResolution {
    /// Line-item identifier.
    pub line_item: String,
    /// Raw field supplying the value, if any.
    pub raw_field: Option<String>,
    /// Layer that produced the match.
    pub strategy: MatchStrategy,
    /// Confidence implied by the strategy.
    pub confidence: Confidence,
    /// Human-readable note.
    pub note: Option<String>,
    /// Other line items resolved to the same raw field.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_with: Vec<String>,
}

impl FieldResolution {
    fn matched(item: &LineItem, field: &str, strategy: MatchStrategy, note: Option<String>) -> Self {
        Self {
            line_item: item.id.clone(),
            raw_field: Some(field.to_string()),
            strategy,
            confidence: strategy.confidence(),
            note,
            shared_with: Vec::new(),
        }
    }

    fn unavailable(item: &LineItem) -> Self {
        Self {
            line_item: item.id.clone(),
            raw_field: None,
            strategy: MatchStrategy::Unavailable,
            confidence: Confidence::None,
            note: Some(NOT_REPORTED.to_string()),
            shared_with: Vec::new(),
        }
    }

    /// Returns true if a raw field was found.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.raw_field.is_some()
    }
}

/// Field mapping for one request: one resolution per catalog entry, in
/// catalog order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    resolutions: Vec<FieldResolution>,
}

impl FieldMapping {
    /// Returns the resolution for a line item.
    #[must_use]
    pub fn get(&self, line_item: &str) -> Option<&FieldResolution> {
        self.resolutions.iter().find(|r| r.line_item == line_item)
    }

    /// Returns an iterator over resolutions in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldResolution> {
        self.resolutions.iter()
    }

    /// Returns the identifiers of line items with no matching raw field.
    pub fn unresolved(&self) -> impl Iterator<Item = &str> {
        self.resolutions
            .iter()
            .filter(|r| !r.is_resolved())
            .map(|r| r.line_item.as_str())
    }

    /// Returns the number of resolved line items.
    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.resolutions.iter().filter(|r| r.is_resolved()).count()
    }

    /// Returns the number of resolutions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resolutions.len()
    }

    /// Returns true if the mapping is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolutions.is_empty()
    }
}

/// Maps catalog line items onto raw provider field names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldResolver {
    min_keyword_share: u32,
}

impl Default for FieldResolver {
    fn default() -> Self {
        Self {
            min_keyword_share: DEFAULT_MIN_KEYWORD_SHARE,
        }
    }
}

impl FieldResolver {
    /// Creates a resolver with the default keyword threshold.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the keyword share (percent, clamped to 1..=100) a raw field must
    /// reach to qualify as a keyword match.
    #[must_use]
    pub fn with_min_keyword_share(mut self, percent: u32) -> Self {
        self.min_keyword_share = percent.clamp(1, 100);
        self
    }

    /// Resolves the catalog against the fields of the statement's most
    /// complete period.
    #[must_use]
    pub fn resolve_statement(&self, raw: &RawStatement, catalog: &LineItemCatalog) -> FieldMapping {
        let names: Vec<&str> = raw
            .representative_period()
            .map(|p| p.field_names().collect())
            .unwrap_or_default();
        self.resolve(names, catalog)
    }

    /// Resolves every catalog entry against the available raw field names.
    ///
    /// Name order matters only for tie-breaking; repeated names are ignored.
    pub fn resolve<I, S>(&self, available: I, catalog: &LineItemCatalog) -> FieldMapping
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = Vec::new();
        for name in available {
            let name = name.as_ref();
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }

        let mut resolutions: Vec<FieldResolution> = catalog
            .iter()
            .map(|item| self.resolve_item(item, &names))
            .collect();

        annotate_shared(&mut resolutions);

        let mapping = FieldMapping { resolutions };
        debug!(
            resolved = mapping.resolved_count(),
            total = mapping.len(),
            "Resolved field mapping"
        );
        mapping
    }

    fn resolve_item(&self, item: &LineItem, names: &[String]) -> FieldResolution {
        if let Some(field) = item
            .candidates
            .iter()
            .find(|c| names.iter().any(|n| n == *c))
        {
            return FieldResolution::matched(item, field, MatchStrategy::Exact, None);
        }

        for candidate in &item.candidates {
            if let Some(field) = names.iter().find(|n| n.eq_ignore_ascii_case(candidate)) {
                return FieldResolution::matched(item, field, MatchStrategy::CaseInsensitive, None);
            }
        }

        let tokens = item.keyword_tokens();
        if !tokens.is_empty() {
            let mut best: Option<(&str, usize)> = None;
            for name in names {
                let matched = keywords::count_matches(&tokens, name);
                if !self.qualifies(matched, tokens.len()) {
                    continue;
                }
                if best.is_none_or(|(_, count)| matched > count) {
                    best = Some((name.as_str(), matched));
                }
            }
            if let Some((field, matched)) = best {
                let note = format!("keyword match ({matched} of {} tokens)", tokens.len());
                return FieldResolution::matched(
                    item,
                    field,
                    MatchStrategy::KeywordPartial,
                    Some(note),
                );
            }
        }

        FieldResolution::unavailable(item)
    }

    fn qualifies(&self, matched: usize, tokens: usize) -> bool {
        matched >= 1 && matched * 100 >= tokens * self.min_keyword_share as usize
    }
}

/// Records which line items share a raw field and notes it on each of them.
fn annotate_shared(resolutions: &mut [FieldResolution]) {
    let mut by_field: HashMap<&str, Vec<String>> = HashMap::new();
    for resolution in resolutions.iter() {
        if let Some(field) = resolution.raw_field.as_deref() {
            by_field
                .entry(field)
                .or_default()
                .push(resolution.line_item.clone());
        }
    }

    let shared: Vec<Vec<String>> = resolutions
        .iter()
        .map(|r| {
            r.raw_field
                .as_deref()
                .and_then(|f| by_field.get(f))
                .map(|ids| ids.iter().filter(|id| **id != r.line_item).cloned().collect())
                .unwrap_or_default()
        })
        .collect();

    for (resolution, others) in resolutions.iter_mut().zip(shared) {
        if others.is_empty() {
            continue;
        }
        let shared_note = format!("combined with {}; value shared, not additive", others.join(", "));
        resolution.note = Some(match resolution.note.take() {
            Some(note) => format!("{note}; {shared_note}"),
            None => shared_note,
        });
        resolution.shared_with = others;
    }
}
