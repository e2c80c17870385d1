use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A normalized fare amount, kept as text so currency values are never
/// rounded through floating point. Two prices are equal only if their
/// normalized text is identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Price(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid price amount: {0:?}")]
pub struct InvalidPrice(pub String);

impl Price {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Price {
    type Err = InvalidPrice;

    /// Accepts a plain decimal amount: digits with at most one `.`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut dots = 0;
        let mut digits = 0;
        for c in s.chars() {
            match c {
                '0'..='9' => digits += 1,
                '.' => dots += 1,
                _ => return Err(InvalidPrice(s.to_string())),
            }
        }
        if digits == 0 || dots > 1 {
            return Err(InvalidPrice(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for Price {
    type Error = InvalidPrice;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Price> for String {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One scraped observation for a fare date. Append-only: several records may
/// exist for the same `content_date`, the latest being the one with the
/// greatest `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRecord {
    pub content_date: NaiveDate,
    pub raw_text: String,
    /// `None` when the label reported no available seats.
    pub price: Option<Price>,
    pub created_at: DateTime<Utc>,
}

/// A day record before the store has stamped it with `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDayRecord {
    pub content_date: NaiveDate,
    pub raw_text: String,
    pub price: Option<Price>,
}

/// A user's standing subscription to price changes on one fare date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Watch {
    pub id: Uuid,
    pub user: Uuid,
    pub watch_date: NaiveDate,
    pub is_enabled: bool,
    /// The price last emailed for this watch, `None` if nothing has been sent
    /// yet or the last notified state was "unavailable".
    pub last_price: Option<Price>,
    pub updated_at: DateTime<Utc>,
}

/// State change applied to a watch at the end of its reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchUpdate {
    /// `Some(p)` replaces `last_price` with `p`; `None` leaves it untouched.
    pub last_price: Option<Option<Price>>,
    pub updated_at: DateTime<Utc>,
}

impl WatchUpdate {
    /// Only refresh `updated_at`.
    pub fn touch(now: DateTime<Utc>) -> Self {
        Self {
            last_price: None,
            updated_at: now,
        }
    }

    /// Record `price` as the last notified price.
    pub fn advance(price: Option<Price>, now: DateTime<Utc>) -> Self {
        Self {
            last_price: Some(price),
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}
