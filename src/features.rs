//! Typed order records and per-record feature derivation

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::info;

use crate::data::RawRecord;
use crate::error::RfmError;

/// Shopping platform a customer ordered through
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    Android,
    Ios,
    Desktop,
    Mobile,
}

impl Channel {
    /// Parse a channel label, case-insensitively
    ///
    /// Accepts both the bare names and the app-suffixed labels the order
    /// export uses (`Android App`, `Ios App`).
    pub fn parse(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_lowercase();
        let name = normalized
            .strip_suffix(" app")
            .unwrap_or(&normalized)
            .trim_end();
        match name {
            "android" => Some(Channel::Android),
            "ios" => Some(Channel::Ios),
            "desktop" => Some(Channel::Desktop),
            "mobile" => Some(Channel::Mobile),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Android => "android",
            Channel::Ios => "ios",
            Channel::Desktop => "desktop",
            Channel::Mobile => "mobile",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A fully typed customer order summary with derived totals
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub customer_id: String,
    pub order_channel: Channel,
    /// Channel of the latest purchase; `None` when it was offline
    pub last_order_channel: Option<Channel>,
    pub first_order_date: NaiveDate,
    pub last_order_date: NaiveDate,
    pub last_order_date_online: NaiveDate,
    pub last_order_date_offline: NaiveDate,
    pub online_orders: u32,
    pub offline_orders: u32,
    pub online_value: f64,
    pub offline_value: f64,
    /// Interest category tags as stored, e.g. `[KADIN, AKTIFSPOR]`
    pub interests: String,
    /// online_orders + offline_orders
    pub total_orders: u32,
    /// online_value + offline_value
    pub total_value: f64,
}

impl OrderRecord {
    /// Whether the interest tags contain `keyword` as a substring
    pub fn has_interest(&self, keyword: &str) -> bool {
        self.interests.contains(keyword)
    }
}

/// Type every raw record and compute its order and spend totals
///
/// Fails on the first record with a missing or malformed field; nothing is
/// zero-filled.
pub fn derive_features(raw: &[RawRecord]) -> Result<Vec<OrderRecord>, RfmError> {
    let records = raw
        .iter()
        .map(derive_record)
        .collect::<Result<Vec<_>, _>>()?;

    info!(records = records.len(), "derived order features");
    Ok(records)
}

fn derive_record(raw: &RawRecord) -> Result<OrderRecord, RfmError> {
    let record = raw.record;
    let field = |value: &Option<String>, name: &'static str| -> Result<String, RfmError> {
        match value.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => Ok(v.to_string()),
            _ => Err(RfmError::MissingField {
                record,
                field: name,
            }),
        }
    };

    let customer_id = field(&raw.master_id, "master_id")?;

    let order_channel = parse_channel(
        record,
        "order_channel",
        &field(&raw.order_channel, "order_channel")?,
    )?;
    let last_order_channel = {
        let label = field(&raw.last_order_channel, "last_order_channel")?;
        if label.eq_ignore_ascii_case("offline") {
            None
        } else {
            Some(parse_channel(record, "last_order_channel", &label)?)
        }
    };

    let first_order_date = parse_date(
        record,
        "first_order_date",
        &field(&raw.first_order_date, "first_order_date")?,
    )?;
    let last_order_date = parse_date(
        record,
        "last_order_date",
        &field(&raw.last_order_date, "last_order_date")?,
    )?;
    let last_order_date_online = parse_date(
        record,
        "last_order_date_online",
        &field(&raw.last_order_date_online, "last_order_date_online")?,
    )?;
    let last_order_date_offline = parse_date(
        record,
        "last_order_date_offline",
        &field(&raw.last_order_date_offline, "last_order_date_offline")?,
    )?;

    let online_orders = parse_count(
        record,
        "order_num_total_ever_online",
        &field(&raw.order_num_total_ever_online, "order_num_total_ever_online")?,
    )?;
    let offline_orders = parse_count(
        record,
        "order_num_total_ever_offline",
        &field(&raw.order_num_total_ever_offline, "order_num_total_ever_offline")?,
    )?;
    let offline_value = parse_amount(
        record,
        "customer_value_total_ever_offline",
        &field(
            &raw.customer_value_total_ever_offline,
            "customer_value_total_ever_offline",
        )?,
    )?;
    let online_value = parse_amount(
        record,
        "customer_value_total_ever_online",
        &field(
            &raw.customer_value_total_ever_online,
            "customer_value_total_ever_online",
        )?,
    )?;

    let interests = field(
        &raw.interested_in_categories_12,
        "interested_in_categories_12",
    )?;

    let total_orders = online_orders.checked_add(offline_orders).ok_or_else(|| {
        RfmError::malformed(
            record,
            "order_num_total_ever_offline",
            &offline_orders.to_string(),
            "total order count overflows",
        )
    })?;

    Ok(OrderRecord {
        customer_id,
        order_channel,
        last_order_channel,
        first_order_date,
        last_order_date,
        last_order_date_online,
        last_order_date_offline,
        online_orders,
        offline_orders,
        online_value,
        offline_value,
        interests,
        total_orders,
        total_value: online_value + offline_value,
    })
}

fn parse_channel(record: usize, field: &'static str, value: &str) -> Result<Channel, RfmError> {
    Channel::parse(value)
        .ok_or_else(|| RfmError::malformed(record, field, value, "unknown channel"))
}

/// Parse a date, dropping any time-of-day part
fn parse_date(record: usize, field: &'static str, value: &str) -> Result<NaiveDate, RfmError> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(datetime.date());
        }
    }
    Err(RfmError::malformed(record, field, value, "expected YYYY-MM-DD"))
}

/// Parse an order count; integral decimals such as `4.0` are accepted
fn parse_count(record: usize, field: &'static str, value: &str) -> Result<u32, RfmError> {
    if let Ok(count) = value.parse::<u32>() {
        return Ok(count);
    }
    let number: f64 = value
        .parse()
        .map_err(|_| RfmError::malformed(record, field, value, "not a number"))?;
    if !number.is_finite() {
        return Err(RfmError::malformed(record, field, value, "not a finite number"));
    }
    if number < 0.0 {
        return Err(RfmError::malformed(record, field, value, "must be non-negative"));
    }
    if number.fract() != 0.0 || number > f64::from(u32::MAX) {
        return Err(RfmError::malformed(record, field, value, "must be a whole count"));
    }
    Ok(number as u32)
}

fn parse_amount(record: usize, field: &'static str, value: &str) -> Result<f64, RfmError> {
    let amount: f64 = value
        .parse()
        .map_err(|_| RfmError::malformed(record, field, value, "not a number"))?;
    if !amount.is_finite() {
        return Err(RfmError::malformed(record, field, value, "not a finite number"));
    }
    if amount < 0.0 {
        return Err(RfmError::malformed(record, field, value, "must be non-negative"));
    }
    Ok(amount)
}
