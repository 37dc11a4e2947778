//! KPIs, filters and groupings over already-fetched activities.
//!
//! Groupings keep first-seen order, the order the backend listed them in.

use std::collections::HashMap;

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;

use crate::api::Totals;
use crate::model::{Activity, Payer};
use crate::money::ratio_percent;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Summary {
    pub total_value: Decimal,
    pub total_paid: Decimal,
    pub remaining: Decimal,
    pub paid_diego: Decimal,
    pub paid_alex: Decimal,
    pub progress_pct: Decimal,
    pub diego_pct: Decimal,
    pub alex_pct: Decimal,
    pub completed: usize,
    pub pending: usize,
    pub total: usize,
}

pub fn summarize(totals: &Totals, activities: &[Activity]) -> Summary {
    let completed = activities.iter().filter(|a| a.is_paid()).count();
    let paid_diego = totals.paid_by(Payer::DiegoAna);
    let paid_alex = totals.paid_by(Payer::AlexRute);
    let contributed: Decimal = Payer::ALL.into_iter().map(|p| totals.paid_by(p)).sum();
    Summary {
        total_value: totals.total_value,
        total_paid: totals.total_paid,
        remaining: totals.total_value - totals.total_paid,
        paid_diego,
        paid_alex,
        progress_pct: ratio_percent(totals.total_paid, totals.total_value),
        diego_pct: ratio_percent(paid_diego, contributed),
        alex_pct: ratio_percent(paid_alex, contributed),
        completed,
        pending: activities.len() - completed,
        total: activities.len(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Period {
    All,
    Month,
    Quarter,
    Year,
}

impl Period {
    pub const ALL: [Period; 4] = [Period::All, Period::Month, Period::Quarter, Period::Year];

    pub fn key(self) -> &'static str {
        match self {
            Period::All => "all",
            Period::Month => "month",
            Period::Quarter => "quarter",
            Period::Year => "year",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Period::All => "Todo o período",
            Period::Month => "Último mês",
            Period::Quarter => "Último trimestre",
            Period::Year => "Último ano",
        }
    }

    pub fn from_key(key: &str) -> Period {
        Period::ALL
            .into_iter()
            .find(|p| p.key() == key)
            .unwrap_or(Period::All)
    }

    pub fn cutoff(self, today: NaiveDate) -> Option<NaiveDate> {
        let months = match self {
            Period::All => return None,
            Period::Month => 1,
            Period::Quarter => 3,
            Period::Year => 12,
        };
        today.checked_sub_months(Months::new(months))
    }
}

/// Rows dated on or after the period's cutoff. Undated rows only survive `All`.
pub fn filter_by_period(activities: &[Activity], period: Period, today: NaiveDate) -> Vec<Activity> {
    match period.cutoff(today) {
        None => activities.to_vec(),
        Some(cutoff) => activities
            .iter()
            .filter(|a| a.parsed_date().map_or(false, |d| d >= cutoff))
            .cloned()
            .collect(),
    }
}

/// `None` keeps every sector.
pub fn filter_by_sector(activities: &[Activity], sector: Option<&str>) -> Vec<Activity> {
    match sector {
        None => activities.to_vec(),
        Some(sector) => activities
            .iter()
            .filter(|a| a.sector_label() == sector)
            .cloned()
            .collect(),
    }
}

pub fn matches_query(activity: &Activity, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    activity
        .display_cells()
        .iter()
        .any(|cell| cell.to_lowercase().contains(&needle))
}

pub fn search(activities: &[Activity], query: &str) -> Vec<Activity> {
    activities
        .iter()
        .filter(|a| matches_query(a, query))
        .cloned()
        .collect()
}

pub fn sectors(activities: &[Activity]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for a in activities {
        let label = a.sector_label();
        if !seen.iter().any(|s| s == label) {
            seen.push(label.to_string());
        }
    }
    seen
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SectorStats {
    pub sector: String,
    pub count: usize,
    pub total: Decimal,
    pub paid: Decimal,
    pub diego: Decimal,
    pub alex: Decimal,
}

impl SectorStats {
    pub fn pending(&self) -> Decimal {
        self.total - self.paid
    }

    pub fn progress_pct(&self) -> Decimal {
        ratio_percent(self.paid, self.total)
    }

    pub fn paid_by(&self, payer: Option<Payer>) -> Decimal {
        match payer {
            None => self.paid,
            Some(Payer::DiegoAna) => self.diego,
            Some(Payer::AlexRute) => self.alex,
        }
    }
}

/// Groups by `key`, creating entries in first-seen order.
fn group_in_order<T, K, N, U>(activities: &[Activity], key: K, new: N, mut update: U) -> Vec<T>
where
    K: Fn(&Activity) -> String,
    N: Fn(String) -> T,
    U: FnMut(&mut T, &Activity),
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<T> = Vec::new();
    for a in activities {
        let k = key(a);
        let slot = match index.get(&k) {
            Some(&i) => i,
            None => {
                groups.push(new(k.clone()));
                index.insert(k, groups.len() - 1);
                groups.len() - 1
            }
        };
        update(&mut groups[slot], a);
    }
    groups
}

pub fn by_sector(activities: &[Activity]) -> Vec<SectorStats> {
    group_in_order(
        activities,
        |a| a.sector_label().to_string(),
        |sector| SectorStats {
            sector,
            ..Default::default()
        },
        |s, a| {
            s.count += 1;
            s.total += a.value;
            s.paid += a.paid_total();
            s.diego += a.diego_ana;
            s.alex += a.alex_rute;
        },
    )
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DateStats {
    pub date: String,
    pub count: usize,
    pub payments: Decimal,
}

pub fn by_date(activities: &[Activity]) -> Vec<DateStats> {
    group_in_order(
        activities,
        |a| a.date_label().to_string(),
        |date| DateStats {
            date,
            ..Default::default()
        },
        |d, a| {
            d.count += 1;
            d.payments += a.paid_total();
        },
    )
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimelinePoint {
    pub date: String,
    pub value: Decimal,
    pub cumulative: Decimal,
}

/// Activities in date order (undated last, ties keep input order) with a running total.
pub fn timeline(activities: &[Activity]) -> Vec<TimelinePoint> {
    let mut sorted: Vec<&Activity> = activities.iter().collect();
    sorted.sort_by_key(|a| (a.parsed_date().is_none(), a.parsed_date()));
    let mut running = Decimal::ZERO;
    sorted
        .into_iter()
        .map(|a| {
            running += a.value;
            TimelinePoint {
                date: a.date_label().to_string(),
                value: a.value,
                cumulative: running,
            }
        })
        .collect()
}

pub fn payer_totals(activities: &[Activity]) -> (Decimal, Decimal) {
    activities.iter().fold((Decimal::ZERO, Decimal::ZERO), |(d, a), act| {
        (d + act.diego_ana, a + act.alex_rute)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn act(id: i64, name: &str, sector: Option<&str>, value: &str, date: Option<&str>, diego: &str, alex: &str) -> Activity {
        Activity {
            id,
            activity: name.into(),
            sector: sector.map(str::to_string),
            value: dec(value),
            date: date.map(str::to_string),
            diego_ana: dec(diego),
            alex_rute: dec(alex),
            valor_restante: None,
            status: None,
        }
    }

    fn sample() -> Vec<Activity> {
        vec![
            act(1, "Piso", Some("Cozinha"), "1000", Some("10/01/2024"), "500", "500"),
            act(2, "Pintura", Some("Sala"), "400", Some("05/03/2024"), "100", "0"),
            act(3, "Azulejo", Some("Cozinha"), "600", Some("01/12/2023"), "0", "0"),
            act(4, "Projeto", None, "250", None, "250", "0"),
        ]
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn summary_counts_and_percentages() {
        let totals = Totals {
            total_value: dec("2250"),
            total_paid: dec("1350"),
            paid_diego: dec("850"),
            paid_alex: dec("500"),
        };
        let s = summarize(&totals, &sample());
        assert_eq!(s.completed, 2);
        assert_eq!(s.pending, 2);
        assert_eq!(s.total, 4);
        assert_eq!(s.remaining, dec("900"));
        assert_eq!(s.paid_diego, dec("850"));
        assert_eq!(s.paid_alex, dec("500"));
        assert_eq!(s.progress_pct, dec("60"));
        assert_eq!(s.diego_pct.round_dp(2), dec("62.96"));
        assert_eq!(s.alex_pct.round_dp(2), dec("37.04"));
    }

    #[test]
    fn summary_of_empty_budget_has_zero_percentages() {
        let s = summarize(&Totals::default(), &[]);
        assert_eq!(s.progress_pct, Decimal::ZERO);
        assert_eq!(s.diego_pct, Decimal::ZERO);
        assert_eq!(s.total, 0);
    }

    #[rstest]
    #[case(Period::All, vec![1, 2, 3, 4])]
    #[case(Period::Month, vec![2])]
    #[case(Period::Quarter, vec![1, 2])]
    #[case(Period::Year, vec![1, 2, 3])]
    fn period_filter_uses_cutoff(#[case] period: Period, #[case] expected: Vec<i64>) {
        let ids: Vec<i64> = filter_by_period(&sample(), period, day(2024, 3, 20))
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn period_keys_round_trip() {
        for p in Period::ALL {
            assert_eq!(Period::from_key(p.key()), p);
        }
        assert_eq!(Period::from_key("decade"), Period::All);
    }

    #[test]
    fn sector_filter_matches_display_label() {
        let rows = filter_by_sector(&sample(), Some("Cozinha"));
        assert_eq!(rows.len(), 2);
        let rows = filter_by_sector(&sample(), Some("-"));
        assert_eq!(rows[0].id, 4);
        assert_eq!(filter_by_sector(&sample(), None).len(), 4);
    }

    #[rstest]
    #[case("", 4)]
    #[case("cozinha", 2)]
    #[case("PINTURA", 1)]
    #[case("1.000,00", 1)]
    #[case("2024", 2)]
    #[case("pendente", 2)]
    #[case("concluído", 2)]
    #[case("telhado", 0)]
    fn search_matches_displayed_cells(#[case] query: &str, #[case] hits: usize) {
        assert_eq!(search(&sample(), query).len(), hits);
    }

    #[test]
    fn sectors_listed_once_in_first_seen_order() {
        assert_eq!(sectors(&sample()), vec!["Cozinha", "Sala", "-"]);
    }

    #[test]
    fn groups_by_sector() {
        let groups = by_sector(&sample());
        assert_eq!(groups.len(), 3);
        let cozinha = &groups[0];
        assert_eq!(cozinha.sector, "Cozinha");
        assert_eq!(cozinha.count, 2);
        assert_eq!(cozinha.total, dec("1600"));
        assert_eq!(cozinha.paid, dec("1000"));
        assert_eq!(cozinha.pending(), dec("600"));
        assert_eq!(cozinha.progress_pct(), dec("62.5"));
        assert_eq!(cozinha.paid_by(Some(Payer::AlexRute)), dec("500"));
    }

    #[test]
    fn groups_by_date_sums_payments() {
        let mut rows = sample();
        rows.push(act(5, "Janela", Some("Sala"), "300", Some("10/01/2024"), "0", "120"));
        let dates = by_date(&rows);
        assert_eq!(dates[0].date, "10/01/2024");
        assert_eq!(dates[0].count, 2);
        assert_eq!(dates[0].payments, dec("1120"));
        assert_eq!(dates.last().unwrap().date, "-");
    }

    #[test]
    fn timeline_sorts_and_accumulates() {
        let points = timeline(&sample());
        let dates: Vec<&str> = points.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(dates, vec!["01/12/2023", "10/01/2024", "05/03/2024", "-"]);
        let cumulative: Vec<Decimal> = points.iter().map(|p| p.cumulative).collect();
        assert_eq!(cumulative, vec![dec("600"), dec("1600"), dec("2000"), dec("2250")]);
    }

    #[test]
    fn payer_totals_sum_shares() {
        assert_eq!(payer_totals(&sample()), (dec("850"), dec("500")));
    }
}
