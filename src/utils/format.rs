/// Render a percentage value with at most two decimal digits, dropping
/// trailing zeros and a dangling decimal point: `33.0` → `"33"`,
/// `33.333` → `"33.33"`. The two-decimal rounding ties half-to-even.
pub fn format_percentage(value: f64) -> String {
    let rendered = format!("{value:.2}");
    rendered
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}
