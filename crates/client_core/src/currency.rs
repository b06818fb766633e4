pub const DEFAULT_CURRENCY: &str = "USD";

pub fn currency_symbol(code: Option<&str>) -> String {
    let Some(code) = code.map(str::trim).filter(|code| !code.is_empty()) else {
        return "$".to_string();
    };

    let code = code.to_ascii_uppercase();
    match code.as_str() {
        "USD" => "$".to_string(),
        "INR" => "₹".to_string(),
        "EUR" => "€".to_string(),
        "GBP" => "£".to_string(),
        _ => format!("{code} "),
    }
}

/// Formats `amount` with two decimals. Non-finite amounts render as zero.
pub fn format_price(amount: f64, code: Option<&str>) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    format!("{}{amount:.2}", currency_symbol(code))
}
