//! Domain models for Expensa

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::categories::normalize_category_name;
use crate::dates::DateRange;
use crate::error::{Error, Result};

/// A recorded expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub amount: f64,
    pub category: String,
    pub item: Option<String>,
    pub note: Option<String>,
    /// Local file reference for a photo/receipt
    pub attachment_uri: Option<String>,
    /// User-assigned expense date
    pub date: NaiveDate,
    /// Insertion time
    pub created_at: DateTime<Utc>,
}

/// An expense as entered on the add-expense form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub attachment_uri: Option<String>,
    pub date: NaiveDate,
}

fn clean_optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl NewTransaction {
    pub fn new(amount: f64, category: &str, date: NaiveDate) -> Self {
        Self {
            amount,
            category: category.to_string(),
            item: None,
            note: None,
            attachment_uri: None,
            date,
        }
    }

    pub fn with_item(mut self, item: &str) -> Self {
        self.item = Some(item.to_string());
        self
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }

    pub fn with_attachment(mut self, uri: &str) -> Self {
        self.attachment_uri = Some(uri.to_string());
        self
    }

    /// Check the form and return a normalized copy ready for insertion
    pub fn validated(&self) -> Result<Self> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(Error::Validation(
                "Amount must be a non-negative number".to_string(),
            ));
        }
        let category = normalize_category_name(&self.category);
        if category.is_empty() {
            return Err(Error::Validation("Category is required".to_string()));
        }
        Ok(Self {
            amount: self.amount,
            category,
            item: clean_optional(&self.item),
            note: clean_optional(&self.note),
            attachment_uri: clean_optional(&self.attachment_uri),
            date: self.date,
        })
    }
}

/// Summed spend for one category in a range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

/// Summed spend for one day in a range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub total: f64,
}

/// Everything a summary screen shows for one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub range: DateRange,
    pub total: f64,
    pub transaction_count: i64,
    pub categories: Vec<CategoryTotal>,
    pub top_days: Vec<DayTotal>,
}

/// A user-defined category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCategory {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Category lists for the picker, in display order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryCatalog {
    pub recent: Vec<String>,
    pub defaults: Vec<String>,
    pub custom: Vec<String>,
}

impl CategoryCatalog {
    /// Defaults followed by custom names
    pub fn all(&self) -> Vec<String> {
        self.defaults.iter().chain(self.custom.iter()).cloned().collect()
    }
}

/// Monthly budget against spend so far
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    /// `YYYY-MM`
    pub month: String,
    pub budget: Option<f64>,
    pub spent: f64,
    pub remaining: Option<f64>,
    /// Spent divided by budget; `None` when no positive budget is set
    pub fraction_used: Option<f64>,
    pub over_budget: bool,
}

impl BudgetStatus {
    pub fn new(month: String, budget: Option<f64>, spent: f64) -> Self {
        let remaining = budget.map(|b| b - spent);
        let fraction_used = budget.filter(|b| *b > 0.0).map(|b| spent / b);
        Self {
            month,
            budget,
            spent,
            remaining,
            fraction_used,
            over_budget: remaining.is_some_and(|r| r < 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_validated_normalizes_fields() {
        let tx = NewTransaction::new(12.5, "  Eating   Out ", date())
            .with_item("  ")
            .with_note(" lunch ");
        let clean = tx.validated().unwrap();
        assert_eq!(clean.category, "Eating Out");
        assert_eq!(clean.item, None);
        assert_eq!(clean.note.as_deref(), Some("lunch"));
    }

    #[test]
    fn test_validated_rejects_bad_amounts() {
        for amount in [-1.0, f64::NAN, f64::INFINITY] {
            let err = NewTransaction::new(amount, "Food", date()).validated().unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }
        assert!(NewTransaction::new(0.0, "Food", date()).validated().is_ok());
    }

    #[test]
    fn test_validated_requires_category() {
        let err = NewTransaction::new(3.0, "   ", date()).validated().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_budget_status_math() {
        let status = BudgetStatus::new("2024-03".into(), Some(100.0), 125.0);
        assert_eq!(status.remaining, Some(-25.0));
        assert_eq!(status.fraction_used, Some(1.25));
        assert!(status.over_budget);

        let unset = BudgetStatus::new("2024-03".into(), None, 10.0);
        assert_eq!(unset.remaining, None);
        assert_eq!(unset.fraction_used, None);
        assert!(!unset.over_budget);

        let zero = BudgetStatus::new("2024-03".into(), Some(0.0), 0.0);
        assert_eq!(zero.fraction_used, None);
        assert!(!zero.over_budget);
    }
}
