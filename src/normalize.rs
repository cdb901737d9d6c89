//! Conversions from ledger encodings to display values.
//!
//! Ratings are stored on the ledger as integer hundredths of a star
//! (`433` is 4.33 stars). Display values are rounded half-up to one decimal.

use chrono::{DateTime, Utc};

/// Highest raw rating the ledger can legitimately report (5.00 stars).
pub const MAX_RATING_RAW: u64 = 500;

/// Converts a raw rating (hundredths of a star) into a display rating in `[0, 5]`.
pub fn to_display_rating(raw: u64) -> f64 {
    tenths_to_f64(rating_tenths(raw))
}

// Rounds hundredths to tenths, half-up, in integer space so 4.35 never becomes 4.3.
fn rating_tenths(raw: u64) -> u64 {
    let clamped = raw.min(MAX_RATING_RAW);
    (clamped + 5) / 10
}

fn tenths_to_f64(tenths: u64) -> f64 {
    tenths as f64 / 10.0
}

/// Average of star values (1..=5) as a display rating; an empty set is 0.
pub fn average_stars(stars: impl IntoIterator<Item = u8>) -> f64 {
    let (total, count) = stars
        .into_iter()
        .fold((0u64, 0u64), |(total, count), s| (total + u64::from(s), count + 1));
    if count == 0 {
        return 0.0;
    }
    // Scale to hundredths so it goes through the same rounding as ledger ratings
    to_display_rating(total * 100 / count)
}

/// Mean of already normalized display ratings, rounded to one decimal; empty is 0.
pub fn mean_rating(ratings: impl IntoIterator<Item = f64>) -> f64 {
    let (total, count) = ratings
        .into_iter()
        .fold((0.0f64, 0u32), |(total, count), r| (total + r, count + 1));
    if count == 0 {
        return 0.0;
    }
    let mean = (total / f64::from(count)).clamp(0.0, 5.0);
    (mean * 10.0).round() / 10.0
}

/// Ledger timestamps are seconds since the epoch; out-of-range values map to the epoch.
pub fn from_ledger_timestamp(secs: u64) -> DateTime<Utc> {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .unwrap_or_default()
}

/// `0x1234...abcd` form of an address; short inputs are returned unchanged.
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Label shown next to a star selection.
pub fn rating_label(stars: u8) -> &'static str {
    match stars {
        1 => "Poor",
        2 => "Fair",
        3 => "Good",
        4 => "Very Good",
        5 => "Excellent",
        _ => "",
    }
}
