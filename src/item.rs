//! Item records and field parsing
//!
//! Contains the typed view of one table row plus the pure parsing helpers
//! used when loading (lenient) and creating (strict) items.

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::cmp::Ordering;

/// Canonical column order of a category table
pub const COLUMNS: [&str; 14] = [
    "id",
    "name",
    "main_category",
    "category",
    "purchase_price",
    "shipping_fee",
    "purchase_date",
    "arrival_date",
    "purchase_channel",
    "condition",
    "remark",
    "sold_price",
    "sold_date",
    "image",
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// One row of a category table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: u64,
    pub name: String,
    pub main_category: String,
    pub category: String,
    pub purchase_price: Option<f64>,
    pub shipping_fee: Option<f64>,
    pub purchase_date: Option<NaiveDate>,
    pub arrival_date: String,
    pub purchase_channel: String,
    pub condition: String,
    pub remark: String,
    pub sold_price: Option<f64>,
    pub sold_date: String,
    pub image: String,
}

impl Item {
    /// Build an item from a raw row, looking columns up by header name.
    ///
    /// Missing columns read as empty. Returns `None` when the id is not an integer.
    pub fn from_row(headers: &[String], row: &[String]) -> Option<Item> {
        let get = |column: &str| -> String {
            headers
                .iter()
                .position(|h| h == column)
                .and_then(|i| row.get(i))
                .cloned()
                .unwrap_or_default()
        };

        let id = parse_id(&get("id"))?;

        Some(Item {
            id,
            name: get("name"),
            main_category: get("main_category"),
            category: get("category"),
            purchase_price: lenient_price(&get("purchase_price")),
            shipping_fee: lenient_price(&get("shipping_fee")),
            purchase_date: parse_purchase_date(&get("purchase_date")),
            arrival_date: get("arrival_date"),
            purchase_channel: get("purchase_channel"),
            condition: get("condition"),
            remark: get("remark"),
            sold_price: lenient_price(&get("sold_price")),
            sold_date: get("sold_date"),
            image: get("image"),
        })
    }

    /// Purchase price plus shipping, treating absent values as 0
    pub fn total_cost(&self) -> f64 {
        self.purchase_price.unwrap_or(0.0) + self.shipping_fee.unwrap_or(0.0)
    }

    /// An item counts as sold when it has a sold price that is a real number.
    /// An explicit 0 is a sale at no cost, not "unsold".
    pub fn is_sold(&self) -> bool {
        matches!(self.sold_price, Some(price) if !price.is_nan())
    }
}

/// Parse an id cell; accepts "7" and whole float renderings such as "7.0".
///
/// Exponents, signs and ids beyond `u64` are rejected.
pub fn parse_id(value: &str) -> Option<u64> {
    let value = value.trim();
    let digits = match value.split_once('.') {
        Some((whole, fraction)) if !fraction.is_empty() && fraction.bytes().all(|b| b == b'0') => {
            whole
        }
        Some(_) => return None,
        None => value,
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Parses a purchase date leniently.
///
/// Accepts plain dates in several separators, date-times and RFC 3339
/// timestamps (only the date part is kept). Blank or unparsable input
/// yields `None`.
pub fn parse_purchase_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Some(datetime.date());
        }
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.date_naive());
    }

    log::debug!("Unparsable purchase date '{}', treating as absent", value);
    None
}

/// Parses a price supplied by the user.
///
/// Blank input is `Ok(None)`. A single decimal comma followed by one or two
/// digits is accepted ("5,50"), but thousands separators ("1,299",
/// "1,234.56") are not. Anything else is a validation error naming the field.
pub fn parse_price(field: &str, value: &str) -> StoreResult<Option<f64>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let invalid = || StoreError::Validation(format!("{} must be a number, got '{}'", field, value));

    let normalized = match value.split_once(',') {
        None => value.to_string(),
        Some((whole, fraction))
            if !value.contains('.')
                && (1..=2).contains(&fraction.len())
                && fraction.bytes().all(|b| b.is_ascii_digit()) =>
        {
            format!("{}.{}", whole, fraction)
        }
        Some(_) => return Err(invalid()),
    };

    normalized.parse::<f64>().map(Some).map_err(|_| invalid())
}

/// Parses a stored price; blank or unparsable cells become `None`
pub fn lenient_price(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match value.parse::<f64>() {
        Ok(price) => Some(price),
        Err(_) => {
            log::warn!("Ignoring unparsable price '{}'", value);
            None
        }
    }
}

/// Render a price for the table the way it was entered numerically
pub fn format_price(value: f64) -> String {
    value.to_string()
}

/// Sort by purchase date descending with dateless rows last, then by name ascending
pub fn sort_items(items: &mut [Item]) {
    items.sort_by(compare_items);
}

fn compare_items(a: &Item, b: &Item) -> Ordering {
    let by_date = match (a.purchase_date, b.purchase_date) {
        (Some(da), Some(db)) => db.cmp(&da),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_date.then_with(|| a.name.cmp(&b.name))
}
