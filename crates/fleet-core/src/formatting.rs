//! Display helpers for money, distances and unknown values.

/// Placeholder shown for a value the source tables did not provide.
pub const UNSET: &str = "—";

/// Format a number with thousands separators and a fixed number of decimals.
///
/// # Examples
///
/// ```
/// use fleet_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5, 1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::with_capacity(fixed.len() + fixed.len() / 3 + 1);
    // `-0.00` would be confusing in a cost column.
    if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Format a dollar amount with two decimals, e.g. `"$31,250.00"`.
///
/// ```
/// use fleet_core::formatting::format_currency;
///
/// assert_eq!(format_currency(31250.0), "$31,250.00");
/// assert_eq!(format_currency(-9.99), "-$9.99");
/// ```
pub fn format_currency(amount: f64) -> String {
    let digits = format_number(amount.abs(), 2);
    if amount < 0.0 && digits != "0.00" {
        format!("-${digits}")
    } else {
        format!("${digits}")
    }
}

/// Format a distance in whole kilometres, e.g. `"184,220 km"`.
pub fn format_distance(km: f64) -> String {
    format!("{} km", format_number(km, 0))
}

/// Apply `f` to a known value, or return [`UNSET`].
pub fn or_unset<T>(value: Option<T>, f: impl Fn(T) -> String) -> String {
    value.map(f).unwrap_or_else(|| UNSET.to_string())
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ── Tests ──────────────────────────────────────────────────────────────────────
