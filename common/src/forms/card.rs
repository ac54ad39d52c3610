//! Payment card input helpers.

use crate::validation::ValidationError;

pub const CARD_DIGITS: std::ops::RangeInclusive<usize> = 13..=19;
pub const CVV_DIGITS: std::ops::RangeInclusive<usize> = 3..=4;

/// Strips all whitespace and groups the rest in fours: `"4242424242424242"`
/// becomes `"4242 4242 4242 4242"`.
pub fn format_card_number(input: &str) -> String {
    let compact: Vec<char> = input.chars().filter(|c| !c.is_whitespace()).collect();
    compact
        .chunks(4)
        .map(|group| group.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keeps digits only and inserts `/` once two digits are present: `"1225"`
/// becomes `"12/25"`. Extra digits past `MM/YY` are dropped.
pub fn format_expiry(input: &str) -> String {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    if digits.len() >= 2 {
        let year: String = digits.chars().skip(2).take(2).collect();
        format!("{}/{}", &digits[..2], year)
    } else {
        digits
    }
}

pub fn card_digit_count(card_number: &str) -> usize {
    card_number.chars().filter(|c| !c.is_whitespace()).count()
}

pub fn check_card_number(card_number: &str) -> Result<(), ValidationError> {
    if CARD_DIGITS.contains(&card_digit_count(card_number)) {
        Ok(())
    } else {
        Err(ValidationError::InvalidCardNumber)
    }
}

pub fn check_cvv(cvv: &str) -> Result<(), ValidationError> {
    if CVV_DIGITS.contains(&cvv.chars().count()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidCvv)
    }
}

/// The last four digits, for order confirmations.
pub fn last_four(card_number: &str) -> String {
    let compact: Vec<char> = card_number.chars().filter(|c| !c.is_whitespace()).collect();
    compact[compact.len().saturating_sub(4)..].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_number_groups_in_fours_regardless_of_spacing() {
        assert_eq!(format_card_number("4242424242424242"), "4242 4242 4242 4242");
        assert_eq!(format_card_number("4242 42424 2424242"), "4242 4242 4242 4242");
        assert_eq!(format_card_number("4242 42424 2424242 42"), "4242 4242 4242 4242 42");
        assert_eq!(format_card_number("  37828224631000 5 "), "3782 8224 6310 005");
        assert_eq!(format_card_number("42"), "42");
        assert_eq!(format_card_number(""), "");
    }

    #[test]
    fn formatting_is_stable_when_reapplied() {
        let once = format_card_number("4000056655665556");
        assert_eq!(format_card_number(&once), once);
    }

    #[test]
    fn expiry_gets_slash_after_exactly_two_digits() {
        assert_eq!(format_expiry("1"), "1");
        assert_eq!(format_expiry("12"), "12/");
        assert_eq!(format_expiry("122"), "12/2");
        assert_eq!(format_expiry("1225"), "12/25");
        assert_eq!(format_expiry("12/25"), "12/25");
        assert_eq!(format_expiry("12-2599"), "12/25");
        assert_eq!(format_expiry("ab"), "");
    }

    #[test]
    fn card_length_bounds() {
        assert!(check_card_number("4242 4242 4242 4").is_ok());
        assert!(check_card_number("4242 4242 4242").is_err());
        assert!(check_card_number(&"4".repeat(19)).is_ok());
        assert!(check_card_number(&"4".repeat(20)).is_err());
    }

    #[test]
    fn cvv_length_bounds() {
        assert_eq!(check_cvv("12"), Err(ValidationError::InvalidCvv));
        assert!(check_cvv("123").is_ok());
        assert!(check_cvv("1234").is_ok());
        assert!(check_cvv("12345").is_err());
    }

    #[test]
    fn last_four_ignores_spacing() {
        assert_eq!(last_four("4242 4242 4242 1881"), "1881");
        assert_eq!(last_four("12"), "12");
    }
}
