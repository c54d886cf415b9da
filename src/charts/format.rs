//! Number formatting shared by tiles, tables and exported charts.

/// Insert thousands separators into a non-negative integer string.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `1234567.8` -> `"1,234,568"`
pub fn thousands(value: f64) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    if rounded < 0.0 {
        format!("-{}", group_thousands(&digits))
    } else {
        group_thousands(&digits)
    }
}

/// `1234.5` -> `"$1,235"`
pub fn money(value: f64) -> String {
    if value < 0.0 {
        format!("-${}", thousands(-value))
    } else {
        format!("${}", thousands(value))
    }
}

/// `0.456` -> `"$0.46"`
pub fn money_cents(value: f64) -> String {
    if value.is_finite() {
        format!("${:.2}", value)
    } else {
        "-".to_string()
    }
}

pub fn percent(value: f64) -> String {
    if value.is_finite() {
        format!("{:.2}%", value)
    } else {
        "-".to_string()
    }
}

/// Compact axis label: 12_500 -> "12.5k", 3_200_000 -> "3.2M".
pub fn compact(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.1}k", value / 1_000.0)
    } else if abs >= 10.0 || value == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Category label for an axis mark, only at integer positions.
pub fn index_label(labels: &[String], value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    labels.get(rounded as usize).cloned().unwrap_or_default()
}
