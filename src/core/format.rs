/// Formats a value as whole US dollars with thousands separators, e.g.
/// `1234567.8 -> "$1,234,568"` and `-1500.0 -> "-$1,500"`.
///
/// Output follows `Intl.NumberFormat("en-US")` with USD currency style and
/// no fraction digits: halves round away from zero, a negative value that
/// rounds to zero keeps its sign (`-0.2 -> "-$0"`), and non-finite values
/// print as `"$NaN"`, `"$∞"` and `"-$∞"`.
pub fn format_currency(value: f64) -> String {
    if value.is_nan() {
        return "$NaN".to_string();
    }
    let sign = if value.is_sign_negative() { "-" } else { "" };
    if value.is_infinite() {
        return format!("{sign}$∞");
    }

    let digits = format!("{:.0}", value.abs().round());
    format!("{sign}${}", group_thousands(&digits))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
