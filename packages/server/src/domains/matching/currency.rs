//! Static currency normalization and conversion.
//!
//! Rates are a deployment-time snapshot. A missing rate is a warning, not an
//! error: the salary factor falls back to its no-data baseline instead of
//! excluding the job.

/// Collapse common spellings and symbols onto ISO codes.
pub fn normalize_currency(code: &str) -> Option<&'static str> {
    let upper = code.trim().to_uppercase();
    match upper.as_str() {
        "NGN" | "NAIRA" | "₦" | "NIGERIAN NAIRA" => Some("NGN"),
        "USD" | "DOLLAR" | "$" | "US DOLLAR" | "AMERICAN DOLLAR" => Some("USD"),
        "EUR" | "EURO" | "€" | "EUROPEAN EURO" => Some("EUR"),
        "GBP" | "POUND" | "£" | "BRITISH POUND" | "STERLING" => Some("GBP"),
        "CAD" | "CANADIAN DOLLAR" | "C$" => Some("CAD"),
        "AUD" | "AUSTRALIAN DOLLAR" | "A$" => Some("AUD"),
        _ => None,
    }
}

const RATES: &[((&str, &str), f64)] = &[
    (("USD", "NGN"), 750.0),
    (("EUR", "NGN"), 820.0),
    (("GBP", "NGN"), 950.0),
    (("USD", "EUR"), 0.92),
    (("USD", "GBP"), 0.79),
    (("EUR", "GBP"), 0.86),
];

/// Conversion factor from one currency to another, if the table knows it.
pub fn conversion_factor(from: &str, to: &str) -> Option<f64> {
    let from = normalize_currency(from)?;
    let to = normalize_currency(to)?;
    if from == to {
        return Some(1.0);
    }
    for ((a, b), rate) in RATES {
        if *a == from && *b == to {
            return Some(*rate);
        }
        if *a == to && *b == from {
            return Some(1.0 / rate);
        }
    }
    None
}

/// Pairs close enough in practice that a partial currency credit applies.
pub fn currencies_related(a: &str, b: &str) -> bool {
    let (Some(a), Some(b)) = (normalize_currency(a), normalize_currency(b)) else {
        return false;
    };
    const RELATED: &[(&str, &str)] = &[
        ("USD", "CAD"),
        ("USD", "AUD"),
        ("GBP", "EUR"),
        ("NGN", "USD"),
        ("NGN", "GBP"),
        ("NGN", "EUR"),
    ];
    RELATED
        .iter()
        .any(|(x, y)| (*x == a && *y == b) || (*x == b && *y == a))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_spellings_and_symbols() {
        assert_eq!(normalize_currency("naira"), Some("NGN"));
        assert_eq!(normalize_currency("₦"), Some("NGN"));
        assert_eq!(normalize_currency(" usd "), Some("USD"));
        assert_eq!(normalize_currency("doubloons"), None);
    }

    #[test]
    fn identity_conversion() {
        assert_eq!(conversion_factor("NGN", "naira"), Some(1.0));
    }

    #[test]
    fn forward_and_reverse_rates() {
        assert_eq!(conversion_factor("USD", "NGN"), Some(750.0));
        let reverse = conversion_factor("NGN", "USD").unwrap();
        assert!((reverse - 1.0 / 750.0).abs() < 1e-9);
    }

    #[test]
    fn missing_rate_is_none() {
        assert_eq!(conversion_factor("CAD", "NGN"), None);
    }

    #[test]
    fn related_pairs() {
        assert!(currencies_related("NGN", "USD"));
        assert!(currencies_related("EUR", "GBP"));
        assert!(!currencies_related("CAD", "NGN"));
    }
}
