use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Whether a transaction adds to or subtracts from the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    /// Parse the wire form ("income" / "expense").
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "income" => Some(TransactionType::Income),
            "expense" => Some(TransactionType::Expense),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single dated income or expense record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Server-assigned opaque identifier, immutable after creation
    pub id: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Always positive; the type carries the sign
    pub amount: f64,
    /// Free-text category label (not a foreign key into the category list)
    pub category: String,
    pub description: String,
    /// Calendar date, "YYYY-MM-DD"
    pub date: String,
    /// RFC 3339 timestamp, set once by the server at creation
    pub created_at: String,
}

impl Transaction {
    /// The "YYYY-MM" prefix of the transaction date. Ingestion guarantees
    /// the ISO form, so the whole-date fallback only shows up for records
    /// written behind the API's back.
    pub fn month(&self) -> &str {
        self.date.get(..7).unwrap_or(&self.date)
    }

    /// Check a stored or imported record against the ingestion invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.amount <= 0.0 {
            return Err("Amount must be a positive number".to_string());
        }
        if self.category.is_empty() {
            return Err("Category is required".to_string());
        }
        if self.description.is_empty() {
            return Err("Description is required".to_string());
        }
        if self.date.is_empty() {
            return Err("Date is required".to_string());
        }
        // Zero-padded ISO form only; anything else breaks lexicographic
        // date comparisons and month bucketing downstream.
        if self.date.len() != 10
            || NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").is_err()
        {
            return Err("Date must be in YYYY-MM-DD format".to_string());
        }
        Ok(())
    }
}

/// A named, colored classification for transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Display color, e.g. "#10b981"
    pub color: String,
    /// Display icon name, defaults to "circle"
    pub icon: String,
}

impl Category {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("Name is required".to_string());
        }
        if self.color.is_empty() {
            return Err("Color is required".to_string());
        }
        Ok(())
    }
}

/// Payload for POST /api/transactions. Every field is optional so the
/// backend can report exactly which required field is missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTransaction {
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    /// Accepted as a JSON number or a numeric string. An explicit null is
    /// kept distinct from an absent field: null is a present-but-invalid
    /// amount, not a missing one.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub amount: Option<serde_json::Value>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

/// Partial update for PUT /api/transactions/:id. Present fields overwrite,
/// absent fields are preserved; the id is never touched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionPatch {
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
}

/// Payload for POST /api/categories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// Aggregate totals over a transaction set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub total_income: f64,
    pub total_expenses: f64,
    pub balance: f64,
    pub transaction_count: usize,
    /// Percent of income kept, rounded to one decimal; 0 when there is no income
    pub savings_rate: f64,
}

impl FinancialSummary {
    /// Single pass over the transactions; totals accumulate by type.
    pub fn calculate(transactions: &[Transaction]) -> Self {
        let mut total_income = 0.0;
        let mut total_expenses = 0.0;
        for t in transactions {
            match t.transaction_type {
                TransactionType::Income => total_income += t.amount,
                TransactionType::Expense => total_expenses += t.amount,
            }
        }
        let balance = total_income - total_expenses;
        let savings_rate = if total_income > 0.0 {
            (balance / total_income * 100.0 * 10.0).round() / 10.0
        } else {
            0.0
        };
        FinancialSummary {
            total_income,
            total_expenses,
            balance,
            transaction_count: transactions.len(),
            savings_rate,
        }
    }
}

/// Per-category income/expense totals and transaction count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub income: f64,
    pub expense: f64,
    pub count: u32,
}

/// Group transactions by category name in a single pass.
pub fn category_breakdown(transactions: &[Transaction]) -> BTreeMap<String, CategoryTotals> {
    let mut breakdown: BTreeMap<String, CategoryTotals> = BTreeMap::new();
    for t in transactions {
        let entry = breakdown.entry(t.category.clone()).or_default();
        match t.transaction_type {
            TransactionType::Income => entry.income += t.amount,
            TransactionType::Expense => entry.expense += t.amount,
        }
        entry.count += 1;
    }
    breakdown
}

/// Per-month income/expense totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotals {
    pub income: f64,
    pub expense: f64,
}

/// Group transactions by the "YYYY-MM" prefix of their date. The map is
/// ordered by month key ascending; input order does not matter.
pub fn monthly_data(transactions: &[Transaction]) -> BTreeMap<String, MonthlyTotals> {
    let mut monthly: BTreeMap<String, MonthlyTotals> = BTreeMap::new();
    for t in transactions {
        let entry = monthly.entry(t.month().to_string()).or_default();
        match t.transaction_type {
            TransactionType::Income => entry.income += t.amount,
            TransactionType::Expense => entry.expense += t.amount,
        }
    }
    monthly
}

/// Relative date window used to filter transactions for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    Week,
    Month,
    Year,
    All,
}

impl ReportPeriod {
    /// "week" / "month" / "year"; anything else means all-time.
    pub fn parse(s: &str) -> Self {
        match s {
            "week" => ReportPeriod::Week,
            "month" => ReportPeriod::Month,
            "year" => ReportPeriod::Year,
            _ => ReportPeriod::All,
        }
    }
}

/// A period-scoped bundle of summary, breakdown, monthly data, and top
/// transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub period: ReportPeriod,
    pub start_date: String,
    pub end_date: String,
    pub summary: FinancialSummary,
    pub category_breakdown: BTreeMap<String, CategoryTotals>,
    pub monthly_data: BTreeMap<String, MonthlyTotals>,
    pub top_expenses: Vec<Transaction>,
    pub top_income: Vec<Transaction>,
    pub transaction_count: usize,
}

impl Report {
    /// Build a report over the transactions dated within the period ending
    /// at `today`. The month and year windows are fixed 30- and 365-day
    /// spans, not calendar months or years.
    pub fn build(transactions: &[Transaction], period: ReportPeriod, today: NaiveDate) -> Self {
        let start_date = match period {
            ReportPeriod::Week => format_date(today - chrono::Duration::days(7)),
            ReportPeriod::Month => format_date(today - chrono::Duration::days(30)),
            ReportPeriod::Year => format_date(today - chrono::Duration::days(365)),
            ReportPeriod::All => "1970-01-01".to_string(),
        };
        let end_date = format_date(today);

        // Zero-padded ISO dates compare correctly as strings; the boundary
        // is inclusive.
        let filtered: Vec<Transaction> = transactions
            .iter()
            .filter(|t| t.date.as_str() >= start_date.as_str())
            .cloned()
            .collect();

        Report {
            period,
            start_date,
            end_date,
            summary: FinancialSummary::calculate(&filtered),
            category_breakdown: category_breakdown(&filtered),
            monthly_data: monthly_data(&filtered),
            top_expenses: top_by_amount(&filtered, TransactionType::Expense),
            top_income: top_by_amount(&filtered, TransactionType::Income),
            transaction_count: filtered.len(),
        }
    }
}

/// Top 5 transactions of the given type by amount descending. The sort is
/// stable, so equal amounts keep their input order.
fn top_by_amount(transactions: &[Transaction], kind: TransactionType) -> Vec<Transaction> {
    let mut picked: Vec<Transaction> = transactions
        .iter()
        .filter(|t| t.transaction_type == kind)
        .cloned()
        .collect();
    picked.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    picked.truncate(5);
    picked
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Response body for GET /api/transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<Transaction>,
    pub summary: FinancialSummary,
    #[serde(rename = "categoryBreakdown")]
    pub category_breakdown: BTreeMap<String, CategoryTotals>,
    #[serde(rename = "monthlyData")]
    pub monthly_data: BTreeMap<String, MonthlyTotals>,
}

/// The whole persisted store, as exported and imported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub transactions: Vec<Transaction>,
    pub categories: Vec<Category>,
}

/// Response body for GET /api/export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResponse {
    pub exported_at: String,
    pub data: StoreSnapshot,
}
