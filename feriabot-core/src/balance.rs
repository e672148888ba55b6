use chrono::{DateTime, Duration, Utc};
use feriabot_types::{Balance, CashFlowEstimate, Transaction, TransactionType};
use rust_decimal::Decimal;
use std::collections::BTreeSet;

/// Descriptions that mark a sale-typed row as money put into the till
/// rather than trade income. Legacy and ambiguous phrasings still land as
/// sales with these descriptions; the aggregator is the single place that
/// normalizes them.
const POSITIVE_ADJUSTMENT_KEYWORDS: [&str; 4] = [
    "saldo inicial",
    "agregado",
    "ajuste positivo",
    "agregado personal",
];

/// Descriptions that mark an expense-typed row as a cash withdrawal.
const NEGATIVE_ADJUSTMENT_KEYWORDS: [&str; 2] = ["retirado", "ajuste negativo"];

const TRAILING_WINDOW_DAYS: i64 = 30;

fn is_positive_adjustment(description: &str) -> bool {
    let description = description.to_lowercase();
    POSITIVE_ADJUSTMENT_KEYWORDS
        .iter()
        .any(|keyword| description.contains(keyword))
}

fn is_negative_adjustment(description: &str) -> bool {
    let description = description.to_lowercase();
    NEGATIVE_ADJUSTMENT_KEYWORDS
        .iter()
        .any(|keyword| description.contains(keyword))
}

/// Folds the sender's full history into a balance. Order of the input does
/// not matter; the computation never mutates anything and is recomputed
/// from scratch on every request.
pub fn aggregate(sender: &str, transactions: &[Transaction], now: DateTime<Utc>) -> Balance {
    let mut total_sales = Decimal::ZERO;
    let mut total_expenses = Decimal::ZERO;
    let mut total_adjustments = Decimal::ZERO;
    let mut last_updated: Option<DateTime<Utc>> = None;

    for transaction in transactions {
        match transaction.kind {
            TransactionType::Sale => {
                if is_positive_adjustment(&transaction.description) {
                    total_adjustments += transaction.amount;
                } else {
                    total_sales += transaction.amount;
                }
            }
            TransactionType::Expense => {
                if is_negative_adjustment(&transaction.description) {
                    // A withdrawal: subtracts from the till.
                    total_adjustments -= transaction.amount;
                } else {
                    total_expenses += transaction.amount;
                }
            }
            TransactionType::CashAdjustment => {
                // Carries its own sign; withdrawals are negative.
                total_adjustments += transaction.amount;
            }
        }

        if last_updated.map_or(true, |latest| transaction.created_at > latest) {
            last_updated = Some(transaction.created_at);
        }
    }

    Balance {
        sender: sender.to_string(),
        current_balance: total_sales - total_expenses + total_adjustments,
        total_sales,
        total_expenses,
        total_adjustments,
        last_updated: last_updated.unwrap_or(now),
    }
}

/// Average of true (non-adjustment) expenses over the trailing 30 days,
/// divided by the number of distinct calendar days with at least one such
/// expense. Falls back to 100 when there is no expense history, so the
/// runway estimate never divides by zero.
pub fn daily_expense_average(transactions: &[Transaction], now: DateTime<Utc>) -> Decimal {
    let window_start = now - Duration::days(TRAILING_WINDOW_DAYS);

    let mut total = Decimal::ZERO;
    let mut expense_days = BTreeSet::new();

    for transaction in transactions {
        if transaction.kind != TransactionType::Expense
            || transaction.created_at < window_start
            || is_negative_adjustment(&transaction.description)
        {
            continue;
        }

        total += transaction.amount;
        expense_days.insert(transaction.created_at.date_naive());
    }

    if expense_days.is_empty() || total <= Decimal::ZERO {
        return Decimal::ONE_HUNDRED;
    }

    total / Decimal::from(expense_days.len() as u64)
}

/// Projects how many days the current balance lasts at the given daily
/// spend. No projection when either side is non-positive.
pub fn cash_flow_estimate(balance: &Balance, daily_average: Decimal) -> CashFlowEstimate {
    let days_left = if balance.current_balance > Decimal::ZERO && daily_average > Decimal::ZERO {
        Some((balance.current_balance / daily_average).round_dp(1))
    } else {
        None
    };

    CashFlowEstimate {
        daily_average,
        days_left,
    }
}
