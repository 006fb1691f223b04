//! Composable query predicates
//!
//! Predicates serve two roles: they are handed to the persistence backend
//! as the filtering half of a query, and they are evaluated directly against
//! in-memory rows (`matches`). The default "exclude deleted" scope relies on
//! predicate equality so it can be applied idempotently and removed again.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::value::DatabaseValue;

/// A row as handed back by the persistence backend
pub type Row = HashMap<String, DatabaseValue>;

/// Comparison operators supported in conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    Equal,
    NotEqual,
    GreaterThanOrEqual,
    LessThanOrEqual,
    IsNull,
    IsNotNull,
}

/// A single column condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub column: String,
    pub operator: ComparisonOperator,
    pub value: Option<DatabaseValue>,
}

/// A composable predicate tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Matches every row
    All,
    Single(Condition),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// `column = value`
    pub fn eq<V: Into<DatabaseValue>>(column: &str, value: V) -> Self {
        Self::single(column, ComparisonOperator::Equal, Some(value.into()))
    }

    /// `column != value`
    pub fn ne<V: Into<DatabaseValue>>(column: &str, value: V) -> Self {
        Self::single(column, ComparisonOperator::NotEqual, Some(value.into()))
    }

    /// `column >= value`
    pub fn gte<V: Into<DatabaseValue>>(column: &str, value: V) -> Self {
        Self::single(column, ComparisonOperator::GreaterThanOrEqual, Some(value.into()))
    }

    /// `column <= value`
    pub fn lte<V: Into<DatabaseValue>>(column: &str, value: V) -> Self {
        Self::single(column, ComparisonOperator::LessThanOrEqual, Some(value.into()))
    }

    /// `column IS NULL`
    pub fn is_null(column: &str) -> Self {
        Self::single(column, ComparisonOperator::IsNull, None)
    }

    /// `column IS NOT NULL`
    pub fn is_not_null(column: &str) -> Self {
        Self::single(column, ComparisonOperator::IsNotNull, None)
    }

    /// Conjunction of predicates
    pub fn and(predicates: Vec<Predicate>) -> Self {
        Predicate::And(predicates)
    }

    /// Disjunction of predicates
    pub fn or(predicates: Vec<Predicate>) -> Self {
        Predicate::Or(predicates)
    }

    fn single(column: &str, operator: ComparisonOperator, value: Option<DatabaseValue>) -> Self {
        Predicate::Single(Condition {
            column: column.to_string(),
            operator,
            value,
        })
    }

    /// Evaluate this predicate against an in-memory row. A column absent
    /// from the row is treated as NULL. `NotEqual` follows SQL three-valued
    /// logic: a NULL column never satisfies it.
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Predicate::All => true,
            Predicate::And(preds) => preds.iter().all(|p| p.matches(row)),
            Predicate::Or(preds) => preds.iter().any(|p| p.matches(row)),
            Predicate::Single(cond) => {
                let actual = row.get(&cond.column).unwrap_or(&DatabaseValue::Null);
                match cond.operator {
                    ComparisonOperator::IsNull => actual.is_null(),
                    ComparisonOperator::IsNotNull => !actual.is_null(),
                    ComparisonOperator::Equal => match &cond.value {
                        Some(expected) => actual == expected,
                        None => actual.is_null(),
                    },
                    ComparisonOperator::NotEqual => match &cond.value {
                        Some(expected) => !actual.is_null() && actual != expected,
                        None => false,
                    },
                    ComparisonOperator::GreaterThanOrEqual => cond
                        .value
                        .as_ref()
                        .and_then(|expected| actual.compare(expected))
                        .map(|ord| ord != std::cmp::Ordering::Less)
                        .unwrap_or(false),
                    ComparisonOperator::LessThanOrEqual => cond
                        .value
                        .as_ref()
                        .and_then(|expected| actual.compare(expected))
                        .map(|ord| ord != std::cmp::Ordering::Greater)
                        .unwrap_or(false),
                }
            }
        }
    }
}
