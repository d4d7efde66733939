//! Display helpers for phone input. These never change the raw value that
//! gets validated and submitted.

const MAX_DIGITS: usize = 10;

/// Keeps the first ten ASCII digits of `input`.
pub fn raw_digits(input: &str) -> String {
    input
        .chars()
        .filter(char::is_ascii_digit)
        .take(MAX_DIGITS)
        .collect()
}

/// Groups digits as `XXX XXX XXXX` progressively while the user types.
///
/// Fewer than four digits are shown as typed, fewer than seven as two groups.
///
/// # Examples
///
/// ```
/// use aircare::validation::format_phone;
///
/// assert_eq!(format_phone("9876543210"), "987 654 3210");
/// assert_eq!(format_phone("987654"), "987 654");
/// assert_eq!(format_phone("987"), "987");
/// ```
pub fn format_phone(raw: &str) -> String {
    let digits = raw_digits(raw);
    match digits.len() {
        0..=3 => digits,
        4..=6 => format!("{} {}", &digits[..3], &digits[3..]),
        _ => format!("{} {} {}", &digits[..3], &digits[3..6], &digits[6..]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progressive_grouping() {
        assert_eq!(format_phone(""), "");
        assert_eq!(format_phone("9"), "9");
        assert_eq!(format_phone("987"), "987");
        assert_eq!(format_phone("9876"), "987 6");
        assert_eq!(format_phone("987654"), "987 654");
        assert_eq!(format_phone("9876543"), "987 654 3");
        assert_eq!(format_phone("9876543210"), "987 654 3210");
    }

    #[test]
    fn reformatting_is_stable() {
        let once = format_phone("9876543210");
        assert_eq!(format_phone(&once), once);
    }

    #[test]
    fn non_digits_and_overflow_are_dropped() {
        assert_eq!(raw_digits("98-765 43(210)"), "9876543210");
        assert_eq!(format_phone("987654321099"), "987 654 3210");
    }
}
