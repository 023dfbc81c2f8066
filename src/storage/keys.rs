//! Key layout
//!
//! | Entity            | PK                | SK                |
//! |-------------------|-------------------|-------------------|
//! | Credential        | `CONFIG`          | `CONFIG`          |
//! | Balance           | `BALANCE`         | `BALANCE`         |
//! | Rate-limit        | `RATELIMIT`       | `RATELIMIT`       |
//! | Month summary     | `MONTH#YYYY-MM`   | `SUMMARY`         |
//! | Expense           | `MONTH#YYYY-MM`   | `EXP#<id>`        |
//! | Session           | `SESSION#<token>` | `SESSION#<token>` |

use crate::models::{ExpenseId, Period, SessionToken};

use super::store::Key;

pub const CONFIG: &str = "CONFIG";
pub const BALANCE: &str = "BALANCE";
pub const RATE_LIMIT: &str = "RATELIMIT";
pub const SUMMARY: &str = "SUMMARY";
pub const MONTH_PREFIX: &str = "MONTH#";
pub const EXPENSE_PREFIX: &str = "EXP#";
pub const SESSION_PREFIX: &str = "SESSION#";

pub fn credential() -> Key {
    Key::new(CONFIG, CONFIG)
}

pub fn balance() -> Key {
    Key::new(BALANCE, BALANCE)
}

pub fn rate_limit() -> Key {
    Key::new(RATE_LIMIT, RATE_LIMIT)
}

pub fn month_pk(period: Period) -> String {
    format!("{}{}", MONTH_PREFIX, period)
}

pub fn month_summary(period: Period) -> Key {
    Key::new(month_pk(period), SUMMARY)
}

pub fn expense(period: Period, id: &ExpenseId) -> Key {
    Key::new(month_pk(period), format!("{}{}", EXPENSE_PREFIX, id))
}

pub fn session(token: &SessionToken) -> Key {
    let id = format!("{}{}", SESSION_PREFIX, token.as_str());
    Key::new(id.clone(), id)
}

/// The period a month partition key belongs to
pub fn period_from_pk(pk: &str) -> Option<Period> {
    pk.strip_prefix(MONTH_PREFIX)
        .and_then(|raw| Period::parse(raw).ok())
}

pub fn expense_id_from_sk(sk: &str) -> Option<ExpenseId> {
    sk.strip_prefix(EXPENSE_PREFIX)
        .filter(|raw| !raw.is_empty())
        .map(ExpenseId::from_raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_keys() {
        let period = Period::parse("2026-03").unwrap();
        assert_eq!(month_summary(period), Key::new("MONTH#2026-03", "SUMMARY"));

        let id = ExpenseId::from_raw("00000000000000000042#deadbeef");
        let key = expense(period, &id);
        assert_eq!(key.sk, "EXP#00000000000000000042#deadbeef");
        assert_eq!(period_from_pk(&key.pk), Some(period));
        assert_eq!(expense_id_from_sk(&key.sk), Some(id));
    }

    #[test]
    fn test_foreign_keys_do_not_parse() {
        assert_eq!(period_from_pk("BALANCE"), None);
        assert_eq!(period_from_pk("MONTH#2026-3"), None);
        assert_eq!(expense_id_from_sk("SUMMARY"), None);
        assert_eq!(expense_id_from_sk("EXP#"), None);
    }
}
