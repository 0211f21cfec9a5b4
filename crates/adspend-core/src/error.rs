use rust_decimal::Decimal;
use thiserror::Error;

/// Rejected input values: budgets, money text, timestamps.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("budget must not be negative (got {0})")]
    NegativeBudget(Decimal),
    #[error("budget cannot exceed {max} (got {value})")]
    BudgetTooLarge { value: Decimal, max: Decimal },
    #[error("invalid amount '{0}'")]
    InvalidAmount(String),
    #[error("amount {0} does not fit in cent storage")]
    OutOfRange(Decimal),
    #[error("invalid timestamp '{0}' (expected RFC 3339, 'YYYY-MM-DD HH:MM:SS' or 'YYYY-MM-DD')")]
    InvalidTimestamp(String),
}
