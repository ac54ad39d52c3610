use num_format::{Locale, ToFormattedString};

/// `$1,234.50`. Negative amounts keep their sign in front of the dollar.
pub fn money(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!(
        "{}${}.{:02}",
        sign,
        (cents / 100).to_formatted_string(&Locale::en),
        cents % 100
    )
}

/// `12.4 KB`, `1.2 MB`.
pub fn file_size(bytes: u64) -> String {
    match bytes {
        b if b < 1024 => format!("{} B", b),
        b if b < 1024 * 1024 => format!("{:.1} KB", b as f64 / 1024.0),
        b => format!("{:.1} MB", b as f64 / (1024.0 * 1024.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_groups_thousands_and_rounds_cents() {
        assert_eq!(money(1234.5), "$1,234.50");
        assert_eq!(money(0.0), "$0.00");
        assert_eq!(money(30.289), "$30.29");
        assert_eq!(money(-5.99), "-$5.99");
    }

    #[test]
    fn file_sizes_pick_a_unit() {
        assert_eq!(file_size(512), "512 B");
        assert_eq!(file_size(204_800), "200.0 KB");
        assert_eq!(file_size(3 * 1024 * 1024), "3.0 MB");
    }
}
