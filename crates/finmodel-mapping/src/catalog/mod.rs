//! Line-item catalog.
//!
//! The catalog is the single list of target line items consumed by both the
//! resolver and the normalizer. Its order is the row order of every rendered
//! statement, and the candidate order inside each entry encodes provider
//! naming preference.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

use finmodel_core::{Result, StatementError};

use crate::keywords;

mod institutional;

/// Well-known line-item identifiers used by derived metrics and diagnostics.
pub mod ids {
    /// Total revenue.
    pub const REVENUES: &str = "Revenues";
    /// Cost of goods sold.
    pub const COST_OF_GOODS_SOLD: &str = "CostOfGoodsSold";
    /// Gross profit.
    pub const GROSS_PROFIT: &str = "GrossProfit";
    /// Total operating expenses.
    pub const OPERATING_EXPENSES: &str = "OperatingExpenses";
    /// Operating income.
    pub const OPERATING_INCOME: &str = "OperatingIncomeLoss";
    /// Net income.
    pub const NET_INCOME: &str = "NetIncomeLoss";
    /// Diluted weighted-average share count.
    pub const DILUTED_SHARES: &str = "WeightedAverageSharesOutstandingDiluted";
}

static INSTITUTIONAL: LazyLock<LineItemCatalog> = LazyLock::new(institutional::catalog);

/// One target line item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Canonical identifier (e.g., `NetIncomeLoss`).
    pub id: String,
    /// Human display name (e.g., `Net Income`).
    pub display_name: String,
    /// Raw field names to try verbatim, in preference order.
    #[serde(default)]
    pub candidates: Vec<String>,
    /// Explicit keyword set for fuzzy matching.
    ///
    /// When empty, keywords are derived from the identifier and display name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl LineItem {
    /// Creates a line item without candidates.
    #[must_use]
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            candidates: Vec::new(),
            keywords: Vec::new(),
        }
    }

    /// Sets the candidate raw field names, keeping their order.
    #[must_use]
    pub fn with_candidates<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidates = candidates.into_iter().map(Into::into).collect();
        self
    }

    /// Sets an explicit keyword set for fuzzy matching.
    #[must_use]
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the keyword tokens used for fuzzy matching.
    #[must_use]
    pub fn keyword_tokens(&self) -> Vec<String> {
        if self.keywords.is_empty() {
            keywords::derive_tokens(&[&self.id, &self.display_name])
        } else {
            keywords::explicit_tokens(&self.keywords)
        }
    }
}

/// Ordered, immutable list of target line items.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LineItem>", into = "Vec<LineItem>")]
pub struct LineItemCatalog {
    items: Vec<LineItem>,
}

impl LineItemCatalog {
    /// Creates a catalog from line items.
    ///
    /// # Errors
    /// Returns [`StatementError::InvalidParameter`] if the list is empty or an
    /// identifier is empty or repeated.
    pub fn new(items: Vec<LineItem>) -> Result<Self> {
        if items.is_empty() {
            return Err(StatementError::InvalidParameter(
                "Line-item catalog is empty".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if item.id.trim().is_empty() {
                return Err(StatementError::InvalidParameter(
                    "Line-item catalog contains an empty identifier".to_string(),
                ));
            }
            if !seen.insert(item.id.as_str()) {
                return Err(StatementError::InvalidParameter(format!(
                    "Duplicate line item in catalog: {}",
                    item.id
                )));
            }
        }

        Ok(Self { items })
    }

    /// Returns the built-in institutional income-statement catalog.
    #[must_use]
    pub fn institutional() -> &'static Self {
        &INSTITUTIONAL
    }

    /// Parses a catalog from a JSON array of line items.
    ///
    /// # Errors
    /// Returns [`StatementError::Parse`] on malformed JSON and
    /// [`StatementError::InvalidParameter`] on an invalid catalog.
    pub fn from_json(json: &str) -> Result<Self> {
        let items: Vec<LineItem> =
            serde_json::from_str(json).map_err(|e| StatementError::Parse(e.to_string()))?;
        Self::new(items)
    }

    /// Returns an iterator over the line items in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter()
    }

    /// Returns the line item with the given identifier.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Returns the number of line items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the catalog has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl TryFrom<Vec<LineItem>> for LineItemCatalog {
    type Error = StatementError;

    fn try_from(items: Vec<LineItem>) -> Result<Self> {
        Self::new(items)
    }
}

impl From<LineItemCatalog> for Vec<LineItem> {
    fn from(catalog: LineItemCatalog) -> Self {
        catalog.items
    }
}

impl<'a> IntoIterator for &'a LineItemCatalog {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
