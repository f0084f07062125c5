//! Brazilian Portuguese number and date conventions
//!
//! Values travel through the page as `1.234,56`: `.` groups thousands and
//! `,` separates decimals. Only this convention is supported.

const MONTH_NAMES: [(&str, &str); 12] = [
    ("01", "Janeiro"),
    ("02", "Fevereiro"),
    ("03", "Março"),
    ("04", "Abril"),
    ("05", "Maio"),
    ("06", "Junho"),
    ("07", "Julho"),
    ("08", "Agosto"),
    ("09", "Setembro"),
    ("10", "Outubro"),
    ("11", "Novembro"),
    ("12", "Dezembro"),
];

pub const INVALID_DATE: &str = "Data inválida";

/// Parse a localized decimal such as `1.234,56`.
///
/// Every `.` is dropped and `,` becomes the decimal point. Malformed input
/// yields NaN rather than an error.
pub fn parse_localized(s: &str) -> f64 {
    s.trim()
        .replace('.', "")
        .replace(',', ".")
        .parse::<f64>()
        .unwrap_or(f64::NAN)
}

/// Format a value as `1.234,56` (two decimals, grouped thousands).
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{},{}", sign, grouped, frac_part)
}

/// Turn `DD/MM/YYYY` into `"<Mês> <ano>"`, or [`INVALID_DATE`].
pub fn month_label(date: &str) -> String {
    let parts: Vec<&str> = date.trim().split('/').collect();
    if parts.len() != 3 {
        return INVALID_DATE.to_string();
    }

    match MONTH_NAMES.iter().find(|(num, _)| *num == parts[1]) {
        Some((_, name)) => format!("{} {}", name, parts[2]),
        None => INVALID_DATE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // PARSING
    // ==========================================================================

    #[test]
    fn test_parse_thousands_and_decimal() {
        assert!((parse_localized("1.234,56") - 1234.56).abs() < 1e-9);
    }

    #[test]
    fn test_parse_strips_every_group_separator() {
        assert!((parse_localized("1.234.567,89") - 1234567.89).abs() < 1e-6);
    }

    #[test]
    fn test_parse_zero() {
        assert_eq!(parse_localized("0,00"), 0.0);
    }

    #[test]
    fn test_parse_malformed_is_nan() {
        assert!(parse_localized("abc").is_nan());
        assert!(parse_localized("").is_nan());
    }

    // ==========================================================================
    // FORMATTING
    // ==========================================================================

    #[test]
    fn test_format_small_values() {
        assert_eq!(format_currency(0.0), "0,00");
        assert_eq!(format_currency(150.0), "150,00");
        assert_eq!(format_currency(999.999), "1.000,00");
    }

    #[test]
    fn test_format_groups_thousands() {
        assert_eq!(format_currency(1234.56), "1.234,56");
        assert_eq!(format_currency(1234567.891), "1.234.567,89");
    }

    #[test]
    fn test_format_negative() {
        assert_eq!(format_currency(-98765.4), "-98.765,40");
    }

    #[test]
    fn test_format_then_parse_is_stable() {
        let formatted = format_currency(42315.07);
        assert!((parse_localized(&formatted) - 42315.07).abs() < 1e-9);
    }

    // ==========================================================================
    // MONTH LABELS
    // ==========================================================================

    #[test]
    fn test_month_label() {
        assert_eq!(month_label("15/03/2024"), "Março 2024");
        assert_eq!(month_label("01/12/2023"), "Dezembro 2023");
    }

    #[test]
    fn test_month_label_invalid() {
        assert_eq!(month_label("2024-03-15"), INVALID_DATE);
        assert_eq!(month_label("15/13/2024"), INVALID_DATE);
        assert_eq!(month_label(""), INVALID_DATE);
    }
}
