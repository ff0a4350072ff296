/// Formats an optional f64 to 2 decimal places, or returns "n/a" if None or non-finite.
pub fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => format!("{x:.2}"),
        _ => "n/a".to_owned(),
    }
}

/// Formats a number with `,` thousands separators and a fixed number of decimals.
///
/// ```
/// use storeaudit::utils::fmt_thousands;
///
/// assert_eq!(fmt_thousands(1234567.891, 2), "1,234,567.89");
/// assert_eq!(fmt_thousands(-9876.0, 0), "-9,876");
/// ```
pub fn fmt_thousands(value: f64, decimals: usize) -> String {
    let rendered = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rendered.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // "-0.00" after rounding reads as a loss that is not there
    let is_zero = rendered.chars().all(|c| c == '0' || c == '.');
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Formats a dollar amount, e.g. `-$1,234.50`.
pub fn fmt_currency(value: f64, decimals: usize) -> String {
    let body = fmt_thousands(value, decimals);
    match body.strip_prefix('-') {
        Some(abs) => format!("-${abs}"),
        None => format!("${body}"),
    }
}
