use crate::error::ParsePercentError;

/// Parse a probability such as `"15,5"` (comma decimal separator) or
/// `"15.5"`. Only the first comma is treated as the decimal point.
pub fn parse_percent(raw: &str) -> Result<f64, ParsePercentError> {
    raw.replacen(',', ".", 1)
        .trim()
        .parse::<f64>()
        .map_err(|_| ParsePercentError { raw: raw.to_string() })
}

/// Two decimals and a percent sign: `15.5` -> `"15.50%"`.
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value)
}
