//! Built-in institutional income-statement catalog.
//!
//! Candidate names are the provider's field names, most specific first.

use super::{LineItem, LineItemCatalog};

/// `(id, display name, candidates, explicit keywords)` in statement order.
type Entry = (
    &'static str,
    &'static str,
    &'static [&'static str],
    &'static [&'static str],
);

const ENTRIES: &[Entry] = &[
    (
        "Revenues",
        "Revenue",
        &["revenues", "total_revenue", "revenue", "net_revenue", "sales_revenue_net"],
        &[],
    ),
    (
        "CostOfGoodsSold",
        "Cost of Goods Sold",
        &[
            "cost_of_revenue",
            "cost_of_goods_and_services_sold",
            "cost_of_goods_sold",
            "cost_of_sales",
        ],
        &[],
    ),
    ("GrossProfit", "Gross Profit", &["gross_profit"], &[]),
    (
        "ResearchAndDevelopmentExpense",
        "Research & Development",
        &[
            "research_and_development",
            "research_and_development_expense",
            "research_and_development_expenses",
        ],
        &[],
    ),
    (
        "SalesAndMarketingExpense",
        "Sales & Marketing",
        &[
            "selling_and_marketing_expenses",
            "sales_and_marketing_expense",
            "selling_and_marketing_expense",
            "selling_general_and_administrative_expenses",
        ],
        &[],
    ),
    (
        "GeneralAndAdministrativeExpense",
        "General & Administrative",
        &[
            "general_and_administrative_expense",
            "general_and_administrative_expenses",
            "selling_general_and_administrative_expenses",
        ],
        &[],
    ),
    (
        "SellingGeneralAndAdministrativeExpenses",
        "Selling, General & Administrative",
        &[
            "selling_general_and_administrative_expenses",
            "selling_general_and_administrative_expense",
        ],
        &[],
    ),
    (
        "OperatingExpenses",
        "Operating Expenses",
        &[
            "operating_expenses",
            "costs_and_expenses",
            "total_operating_expenses",
        ],
        &["operating", "expense"],
    ),
    (
        "OperatingIncomeLoss",
        "Operating Income",
        &["operating_income_loss", "operating_income"],
        &["operating", "income"],
    ),
    (
        "InterestAndOtherIncomeExpense",
        "Interest & Other Income",
        &[
            "nonoperating_income_loss",
            "interest_and_other_income_expense",
            "other_nonoperating_income_expense",
            "interest_income_expense_net",
        ],
        &[],
    ),
    (
        "DepreciationAndAmortization",
        "Depreciation & Amortization",
        &["depreciation_and_amortization", "depreciation_amortization_and_accretion"],
        &[],
    ),
    (
        "IncomeLossBeforeIncomeTaxes",
        "Pre-Tax Income",
        &[
            "income_loss_from_continuing_operations_before_tax",
            "income_loss_before_income_taxes",
            "income_before_income_taxes",
        ],
        &[],
    ),
    (
        "IncomeTaxExpenseBenefit",
        "Income Tax Expense",
        &["income_tax_expense_benefit", "provision_for_income_taxes"],
        &["tax", "expense"],
    ),
    (
        "NetIncomeLoss",
        "Net Income",
        &[
            "net_income_loss",
            "net_income_loss_attributable_to_parent",
            "net_income",
        ],
        &["net", "income"],
    ),
    (
        "WeightedAverageSharesOutstandingDiluted",
        "Diluted Shares Outstanding",
        &[
            "diluted_average_shares",
            "weighted_average_shares_outstanding_diluted",
            "weighted_average_number_of_diluted_shares_outstanding",
        ],
        &[],
    ),
];

/// Builds the catalog from the static table.
///
/// The table is covered by `test_institutional_catalog_is_valid`, so it is not
/// re-validated at runtime.
pub(super) fn catalog() -> LineItemCatalog {
    let items = ENTRIES
        .iter()
        .map(|(id, display_name, candidates, keywords)| {
            LineItem::new(*id, *display_name)
                .with_candidates(candidates.iter().copied())
                .with_keywords(keywords.iter().copied())
        })
        .collect();
    LineItemCatalog { items }
}
