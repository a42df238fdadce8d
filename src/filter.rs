use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::deal::Deal;

/// The user's current selection.
///
/// A criterion that is `None` lets every deal through. A criterion holding an
/// empty set lets nothing through, so "no filter" and "nothing selected" stay
/// two different states.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DealFilter {
    pub reporting_date: Option<NaiveDate>,
    pub business_lines: Option<BTreeSet<String>>,
    pub product_lines: Option<BTreeSet<String>>,
    pub product_names: Option<BTreeSet<String>>,
    pub currencies: Option<BTreeSet<String>>,
}

fn allows(allowed: &Option<BTreeSet<String>>, value: &Option<String>) -> bool {
    match allowed {
        None => true,
        Some(set) => value.as_ref().is_some_and(|v| set.contains(v)),
    }
}

impl DealFilter {
    /// filter that keeps everything
    pub fn all() -> Self {
        Self::default()
    }

    pub fn matches(&self, deal: &Deal) -> bool {
        if let Some(date) = self.reporting_date {
            if deal.reporting_date != Some(date) {
                return false;
            }
        }
        allows(&self.business_lines, &deal.business_line)
            && allows(&self.product_lines, &deal.product_line)
            && allows(&self.product_names, &deal.product_name)
            && allows(&self.currencies, &deal.currency)
    }

    /// Borrow the deals that pass, in input order
    pub fn apply<'a>(&self, deals: &'a [Deal]) -> Vec<&'a Deal> {
        let kept: Vec<&Deal> = deals.iter().filter(|d| self.matches(d)).collect();
        log::debug!("filter kept {} of {} deals", kept.len(), deals.len());
        kept
    }
}

/// Earliest and latest reporting date, the bounds of the date picker
pub fn reporting_date_bounds(deals: &[Deal]) -> Option<(NaiveDate, NaiveDate)> {
    let mut dates = deals.iter().filter_map(|d| d.reporting_date);
    let first = dates.next()?;
    Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
}

/// The date the picker starts on: the reporting date of the first deal
pub fn default_reporting_date(deals: &[Deal]) -> Option<NaiveDate> {
    deals.first().and_then(|d| d.reporting_date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deal(id: &str, reporting: (i32, u32, u32), line: &str, currency: &str) -> Deal {
        Deal {
            deal_id: Some(id.into()),
            reporting_date: NaiveDate::from_ymd_opt(reporting.0, reporting.1, reporting.2),
            business_line: Some(line.into()),
            currency: Some(currency.into()),
            ..Default::default()
        }
    }

    fn deals() -> Vec<Deal> {
        vec![
            deal("1", (2024, 3, 31), "Corporate", "EUR"),
            deal("2", (2024, 3, 31), "Markets", "USD"),
            deal("3", (2024, 6, 30), "Corporate", "USD"),
        ]
    }

    fn ids(kept: Vec<&Deal>) -> Vec<&str> {
        kept.into_iter().filter_map(|d| d.deal_id.as_deref()).collect()
    }

    #[test]
    fn no_criteria_keeps_everything() {
        let deals = deals();
        assert_eq!(3, DealFilter::all().apply(&deals).len());
    }

    #[test]
    fn criteria_are_combined() {
        let deals = deals();
        let filter = DealFilter {
            reporting_date: NaiveDate::from_ymd_opt(2024, 3, 31),
            currencies: Some(["USD".to_string()].into()),
            ..Default::default()
        };
        assert_eq!(vec!["2"], ids(filter.apply(&deals)));

        let filter = DealFilter {
            business_lines: Some(["Corporate".to_string()].into()),
            ..Default::default()
        };
        assert_eq!(vec!["1", "3"], ids(filter.apply(&deals)));
    }

    #[test]
    fn empty_selection_keeps_nothing() {
        let deals = deals();
        let filter = DealFilter {
            business_lines: Some(BTreeSet::new()),
            ..Default::default()
        };
        assert!(filter.apply(&deals).is_empty());
    }

    #[test]
    fn missing_category_never_matches_a_selection() {
        let deals = vec![Deal::default()];
        let filter = DealFilter {
            product_lines: Some(["Loans".to_string()].into()),
            ..Default::default()
        };
        assert!(filter.apply(&deals).is_empty());
        assert_eq!(1, DealFilter::all().apply(&deals).len());
    }

    #[test]
    fn date_picker_bounds() {
        let deals = deals();
        assert_eq!(
            Some((
                NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
                NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
            )),
            reporting_date_bounds(&deals)
        );
        assert_eq!(NaiveDate::from_ymd_opt(2024, 3, 31), default_reporting_date(&deals));
        assert_eq!(None, reporting_date_bounds(&[]));
    }
}
