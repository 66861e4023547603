/// Format a value in fixed notation with `precision` fractional digits,
/// then drop trailing zero digits and a dangling decimal point.
///
/// ```
/// use concalc_syntax::format_value;
///
/// assert_eq!(format_value(4.0, 10), "4");
/// assert_eq!(format_value(2.5, 10), "2.5");
/// assert_eq!(format_value(1.0 / 3.0, 4), "0.3333");
/// ```
pub fn format_value(value: f64, precision: usize) -> String {
    let mut out = format!("{value:.precision$}");
    if out.contains('.') {
        let trimmed = out.trim_end_matches('0').trim_end_matches('.').len();
        out.truncate(trimmed);
    }
    if out == "-0" {
        out = "0".to_string();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(100.0, 10, "100")]
    #[case(0.1 + 0.2, 10, "0.3")]
    #[case(10.0 / 3.0, 10, "3.3333333333")]
    #[case(-2.5, 10, "-2.5")]
    #[case(-0.000_000_000_01, 10, "0")]
    #[case(2.0 / 3.0, 2, "0.67")]
    #[case(1234.4, 0, "1234")]
    #[case(1e20, 10, "100000000000000000000")]
    fn test_format_value(#[case] value: f64, #[case] precision: usize, #[case] expected: &str) {
        assert_eq!(format_value(value, precision), expected);
    }
}
