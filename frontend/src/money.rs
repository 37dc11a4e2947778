//! pt-BR money, percentage and date helpers.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

const BR_DATE: &str = "%d/%m/%Y";
const ISO_DATE: &str = "%Y-%m-%d";

fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// `1234.5` -> `R$ 1.234,50`
pub fn format_brl(value: Decimal) -> String {
    let rounded = round_cents(value);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let plain = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));
    format!("R$ {}{},{}", sign, group_thousands(int_part), frac_part)
}

/// Parses amounts typed by users or read from receipts.
///
/// A comma marks the Brazilian form (`1.234,56`), where dots are thousands
/// separators. Without a comma the dot is the decimal point.
pub fn parse_brl(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .replace("R$", "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };
    Decimal::from_str(&normalized).ok()
}

/// Plain decimal string the backend's `float()` accepts.
pub fn to_wire_amount(value: Decimal) -> String {
    round_cents(value).normalize().to_string()
}

pub fn ratio_percent(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    part.checked_div(whole)
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

/// `12.3456` -> `12.35%`
pub fn format_percent(value: Decimal) -> String {
    format!("{:.2}%", round_cents(value))
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, BR_DATE)
        .or_else(|_| NaiveDate::parse_from_str(raw, ISO_DATE))
        .ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(BR_DATE).to_string()
}

/// Value for an `<input type="date">`; empty when the date is unknown.
pub fn br_to_iso(raw: &str) -> String {
    parse_date(raw)
        .map(|d| d.format(ISO_DATE).to_string())
        .unwrap_or_default()
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn today_iso() -> String {
    today().format(ISO_DATE).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[rstest]
    #[case("0", "R$ 0,00")]
    #[case("5", "R$ 5,00")]
    #[case("999.999", "R$ 1.000,00")]
    #[case("1234.5", "R$ 1.234,50")]
    #[case("1234567.891", "R$ 1.234.567,89")]
    #[case("-250.005", "R$ -250,01")]
    fn formats_brazilian_currency(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(format_brl(dec(input)), expected);
    }

    #[rstest]
    #[case("R$ 1.234,56", "1234.56")]
    #[case("R$1.234,56", "1234.56")]
    #[case("1234,56", "1234.56")]
    #[case("1234.56", "1234.56")]
    #[case(" 350 ", "350")]
    #[case("R$ 12.345.678,90", "12345678.90")]
    fn parses_receipt_and_form_amounts(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(parse_brl(input), Some(dec(expected)));
    }

    #[rstest]
    #[case("")]
    #[case("R$ ")]
    #[case("abc")]
    #[case("12,34,56")]
    fn rejects_garbage_amounts(#[case] input: &str) {
        assert_eq!(parse_brl(input), None);
    }

    #[test]
    fn wire_amount_drops_trailing_zeros() {
        assert_eq!(to_wire_amount(dec("1500.00")), "1500");
        assert_eq!(to_wire_amount(dec("1234.567")), "1234.57");
    }

    #[test]
    fn ratio_guards_zero_whole() {
        assert_eq!(ratio_percent(dec("10"), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(ratio_percent(dec("25"), dec("200")), dec("12.5"));
        assert_eq!(format_percent(ratio_percent(dec("1"), dec("3"))), "33.33%");
    }

    #[test]
    fn dates_round_trip_between_formats() {
        assert_eq!(parse_date("15/03/2024"), NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(parse_date("2024-03-15"), NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(parse_date("31/02/2024"), None);
        assert_eq!(format_date(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()), "05/03/2024");
        assert_eq!(br_to_iso("05/11/2023"), "2023-11-05");
        assert_eq!(br_to_iso("-"), "");
    }
}
