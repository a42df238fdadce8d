//! Dashboard pages.
//!
//! Every user action runs the same pipeline from scratch: filter the loaded
//! deals, build the canonical table, aggregate it into the shapes one page
//! needs. Nothing is kept between two requests apart from the loaded deals.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::aggregate::{self, Pivot};
use crate::config::LEAGUE_SIZE_RANGE;
use crate::deal::{Deal, columns, deals_to_table};
use crate::error::{DealError, DealResult};
use crate::filter::DealFilter;
use crate::geo::CountryCodeLookup;
use crate::table::{Table, Value};

/// Ordered colors, handed out to series by position and wrapping around
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    colors: Vec<String>,
}

impl Palette {
    pub fn new(colors: Vec<String>) -> DealResult<Self> {
        if colors.is_empty() {
            return Err(DealError::InvalidArgument("palette must not be empty".into()));
        }
        Ok(Self { colors })
    }

    pub fn color(&self, index: usize) -> &str {
        &self.colors[index % self.colors.len()]
    }
}

/// A named line or bar series with the color it is drawn in
#[derive(Clone, Debug, PartialEq)]
pub struct Trace {
    pub name: String,
    pub color: String,
    pub x: Vec<Value>,
    pub y: Vec<f64>,
}

/// one trace per measure column of `table`, all sharing `x_column`
fn traces(table: &Table, x_column: &str, measures: &[&str], palette: &Palette, first_color: usize) -> DealResult<Vec<Trace>> {
    let x: Vec<Value> = table.column(x_column)?.cloned().collect();
    measures
        .iter()
        .enumerate()
        .map(|(i, measure)| -> DealResult<Trace> {
            let y = table
                .column(measure)?
                .map(|v| v.as_f64().unwrap_or_default())
                .collect();
            Ok(Trace {
                name: measure.to_string(),
                color: palette.color(first_color + i).to_string(),
                x: x.clone(),
                y,
            })
        })
        .collect()
}

fn require_measure(name: &str) -> DealResult<()> {
    if columns::is_measure(name) {
        Ok(())
    } else {
        Err(DealError::InvalidArgument(format!("'{name}' is not a measure")))
    }
}

/// A headline number with its monthly trend line
#[derive(Clone, Debug, PartialEq)]
pub struct Kpi {
    pub label: &'static str,
    pub measure: &'static str,
    pub value: f64,
    pub trend: Table,
}

pub const KPI_CARDS: [(&str, &str); 5] = [
    ("Net Volume", columns::PRODUCT_VOLUME),
    ("Upfront Fees", columns::UPFRONT_FEES),
    ("Added Value", columns::EVA),
    ("Net Margin", columns::NET_MARGIN),
    ("Gross Margin", columns::GROSS_MARGIN),
];

const FEE_MEASURES: [&str; 2] = [columns::UPFRONT_FEES, columns::UPFRONT_FEES_SKIM];
const RWA_MEASURES: [&str; 3] = [columns::RWA_SPOT, columns::RWA_HTM, columns::RWA_RELEASE];
const DISTRIBUTION_MEASURES: [&str; 4] = [
    columns::PRODUCT_VOLUME,
    columns::GROSS_MARGIN,
    columns::NET_MARGIN,
    columns::UPFRONT_FEES,
];

#[derive(Clone, Debug, PartialEq)]
pub struct Overview {
    pub kpis: Vec<Kpi>,
    /// stacked bars: product name by business line
    pub volume_by_product: Table,
    pub fees_over_time: Vec<Trace>,
    pub rwa_by_product: Vec<Trace>,
    pub settlement_durations: Vec<i64>,
    pub volume_by_country: Table,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LeagueTable {
    pub measure: String,
    pub investors: Table,
    pub color: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Ventilation {
    pub by: String,
    pub distribution: Pivot,
    pub by_line_and_region: Table,
}

/// What the historical page should plot
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistoryRequest {
    pub metrics: Vec<String>,
    /// inclusive signing date window, everything when `None`
    pub window: Option<(NaiveDate, NaiveDate)>,
    /// business lines to keep inside the window, every line when `None`
    pub business_lines: Option<BTreeSet<String>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Historical {
    pub trend: Table,
    pub traces: Vec<Trace>,
}

/// The loaded deals together with the collaborators the pages need
pub struct Dashboard<'a> {
    deals: &'a [Deal],
    lookup: &'a dyn CountryCodeLookup,
    palette: Palette,
}

impl<'a> Dashboard<'a> {
    pub fn new(deals: &'a [Deal], lookup: &'a dyn CountryCodeLookup, palette: Palette) -> Self {
        Self {
            deals,
            lookup,
            palette,
        }
    }

    fn table(&self, filter: &DealFilter) -> DealResult<Table> {
        deals_to_table(filter.apply(self.deals))
    }

    pub fn overview(&self, filter: &DealFilter) -> DealResult<Overview> {
        let table = self.table(filter)?;

        let kpis = KPI_CARDS
            .iter()
            .map(|&(label, measure)| -> DealResult<Kpi> {
                Ok(Kpi {
                    label,
                    measure,
                    value: aggregate::total(&table, measure)?,
                    trend: aggregate::month_bucketed_sum(&table, measure)?,
                })
            })
            .collect::<DealResult<Vec<_>>>()?;

        let volume_by_product = aggregate::sum_by(
            &table,
            &[columns::PRODUCT_NAME, columns::BUSINESS_LINE],
            &[columns::PRODUCT_VOLUME],
        )?;

        let fees = aggregate::daily_sum(&table, columns::SIGNING_DATE, &FEE_MEASURES)?;
        let fees_over_time = traces(&fees, columns::SIGNING_DATE, &FEE_MEASURES, &self.palette, 1)?;

        let rwa = aggregate::pivot_measures(&table, columns::PRODUCT_NAME, &RWA_MEASURES)?;
        let rwa_by_product = rwa
            .iter()
            .enumerate()
            .map(|(i, series)| Trace {
                name: series.measure.clone(),
                color: self.palette.color(1 + i).to_string(),
                x: series.labels.clone(),
                y: series.values.clone(),
            })
            .collect();

        Ok(Overview {
            kpis,
            volume_by_product,
            fees_over_time,
            rwa_by_product,
            settlement_durations: aggregate::duration_distribution(&table)?,
            volume_by_country: aggregate::geo_sum(
                &table,
                columns::COUNTRY,
                columns::PRODUCT_VOLUME,
                self.lookup,
            )?,
        })
    }

    /// Investor league table for one of the headline measures.
    ///
    /// Investors come out in ascending order of the measure, see [`aggregate::top_n`].
    pub fn league(&self, filter: &DealFilter, measure: &str, size: usize) -> DealResult<LeagueTable> {
        if !columns::HEADLINE_MEASURES.contains(&measure) {
            return Err(DealError::InvalidArgument(format!(
                "'{measure}' is not a league table measure, pick one of {:?}",
                columns::HEADLINE_MEASURES
            )));
        }
        if !LEAGUE_SIZE_RANGE.contains(&size) {
            return Err(DealError::InvalidArgument(format!(
                "league size {size} outside {}..={}",
                LEAGUE_SIZE_RANGE.start(),
                LEAGUE_SIZE_RANGE.end()
            )));
        }

        let table = self.table(filter)?;
        Ok(LeagueTable {
            measure: measure.to_string(),
            investors: aggregate::top_n(&table, columns::INVESTOR_NAME, measure, size)?,
            color: self.palette.color(1).to_string(),
        })
    }

    /// Metric shares along one dimension, and `metric` by business line and region
    pub fn ventilation(&self, filter: &DealFilter, by: &str, metric: &str) -> DealResult<Ventilation> {
        require_measure(metric)?;
        let table = self.table(filter)?;
        Ok(Ventilation {
            by: by.to_string(),
            distribution: aggregate::pivot_measures(&table, by, &DISTRIBUTION_MEASURES)?,
            by_line_and_region: aggregate::sum_by(
                &table,
                &[columns::BUSINESS_LINE, columns::REGION],
                &[metric],
            )?,
        })
    }

    pub fn historical(&self, filter: &DealFilter, request: &HistoryRequest) -> DealResult<Historical> {
        if request.metrics.is_empty() {
            return Err(DealError::InvalidArgument("no metric to plot".into()));
        }
        for metric in &request.metrics {
            require_measure(metric)?;
        }
        let table = self.table(filter)?;
        let metrics: Vec<&str> = request.metrics.iter().map(String::as_str).collect();

        let trend = match (&request.window, &request.business_lines) {
            (None, None) => aggregate::daily_sum(&table, columns::SIGNING_DATE, &metrics)?,
            (Some((start, end)), None) => {
                aggregate::range_sum(&table, columns::SIGNING_DATE, *start, *end, &metrics)?
            }
            (window, Some(lines)) => {
                let (start, end) = window.unwrap_or((NaiveDate::MIN, NaiveDate::MAX));
                aggregate::filtered_range_sum(
                    &table,
                    columns::SIGNING_DATE,
                    start,
                    end,
                    columns::BUSINESS_LINE,
                    lines,
                    &metrics,
                )?
            }
        };
        let traces = traces(&trend, columns::SIGNING_DATE, &metrics, &self.palette, 0)?;
        Ok(Historical { trend, traces })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PALETTE;
    use crate::geo::CountryCodes;
    use crate::input::load_deals;
    use pretty_assertions::assert_eq;

    fn palette() -> Palette {
        Palette::new(DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect()).unwrap()
    }

    fn fixture() -> Vec<Deal> {
        load_deals("testdata/deals.csv", b';', true).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn palette_wraps_around() {
        let palette = Palette::new(vec!["red".into(), "blue".into()]).unwrap();
        assert_eq!("blue", palette.color(1));
        assert_eq!("red", palette.color(4));
        assert!(Palette::new(Vec::new()).is_err());
    }

    #[test]
    fn overview_for_one_reporting_date() {
        let deals = fixture();
        let codes = CountryCodes::builtin();
        let dashboard = Dashboard::new(&deals, &codes, palette());
        let filter = DealFilter {
            reporting_date: Some(date(2024, 3, 31)),
            ..Default::default()
        };
        let overview = dashboard.overview(&filter).unwrap();

        assert_eq!(5, overview.kpis.len());
        let volume = &overview.kpis[0];
        assert_eq!("Net Volume", volume.label);
        assert_eq!(8750.0, volume.value);
        let months: Vec<_> = volume
            .trend
            .column(columns::SIGNING_MONTH)
            .unwrap()
            .map(|v| v.to_string())
            .collect();
        assert_eq!(vec!["January", "February", "March", "December"], months);

        // Term Loan/Corporate, Revolver/Corporate, Green Bond/Markets, Covered Bond/Markets, Swap/Markets
        assert_eq!(5, overview.volume_by_product.len());
        assert_eq!(
            Some(&Value::Number(1750.0)),
            overview.volume_by_product.get(0, columns::PRODUCT_VOLUME)
        );

        assert_eq!(2, overview.fees_over_time.len());
        assert_eq!(DEFAULT_PALETTE[1], overview.fees_over_time[0].color);
        assert_eq!(6, overview.fees_over_time[0].x.len());

        assert_eq!(3, overview.rwa_by_product.len());
        assert_eq!(
            vec![Value::from("Term Loan"), "Revolver".into(), "Green Bond".into(), "Covered Bond".into(), "Swap".into()],
            overview.rwa_by_product[0].x
        );
        assert_eq!(vec![175.0, 200.0, 120.0, 50.0, 300.0], overview.rwa_by_product[0].y);

        assert_eq!(vec![5, 12, 2, 16, 18, 14], overview.settlement_durations);
        assert_eq!(6, overview.volume_by_country.len());
    }

    #[test]
    fn unmapped_country_has_null_code() {
        let deals = fixture();
        let codes = CountryCodes::builtin();
        let dashboard = Dashboard::new(&deals, &codes, palette());
        let overview = dashboard.overview(&DealFilter::all()).unwrap();

        let map = &overview.volume_by_country;
        let atlantis = (0..map.len())
            .find(|&row| map.get(row, columns::COUNTRY) == Some(&Value::from("Atlantis")))
            .unwrap();
        assert_eq!(Some(&Value::Null), map.get(atlantis, columns::ISO_CODE));
        // D010 has no country at all
        assert!((0..map.len()).any(|row| map.get(row, columns::COUNTRY) == Some(&Value::Null)));
    }

    #[test]
    fn league_table_lists_smallest_investors_first() {
        let deals = fixture();
        let codes = CountryCodes::builtin();
        let dashboard = Dashboard::new(&deals, &codes, palette());
        let league = dashboard
            .league(&DealFilter::all(), columns::PRODUCT_VOLUME, 5)
            .unwrap();

        let investors: Vec<_> = league
            .investors
            .column(columns::INVESTOR_NAME)
            .unwrap()
            .map(|v| v.to_string())
            .collect();
        assert_eq!(
            vec!["Zeta Holdings", "Delta Invest", "Epsilon AM", "Gamma Fund", "Alpha Capital"],
            investors
        );
    }

    #[test]
    fn league_arguments_are_checked() {
        let deals = fixture();
        let codes = CountryCodes::builtin();
        let dashboard = Dashboard::new(&deals, &codes, palette());
        assert!(dashboard.league(&DealFilter::all(), columns::RWA_HTM, 10).is_err());
        assert!(dashboard.league(&DealFilter::all(), columns::EVA, 3).is_err());
        assert!(dashboard.league(&DealFilter::all(), columns::EVA, 15).is_ok());
    }

    #[test]
    fn ventilation_by_currency() {
        let deals = fixture();
        let codes = CountryCodes::builtin();
        let dashboard = Dashboard::new(&deals, &codes, palette());
        let page = dashboard
            .ventilation(&DealFilter::all(), columns::CURRENCY, columns::NET_MARGIN)
            .unwrap();

        assert_eq!(4, page.distribution.len());
        let volume = page.distribution.get(columns::PRODUCT_VOLUME).unwrap();
        assert_eq!(vec![Value::from("EUR"), "USD".into(), "GBP".into()], volume.labels);
        assert_eq!(vec![5050.0, 5900.0, 900.0], volume.values);

        // Corporate/Europe, Corporate/Americas, Markets/Europe, Markets/Asia, Markets/Americas
        assert_eq!(5, page.by_line_and_region.len());

        assert!(matches!(
            dashboard.ventilation(&DealFilter::all(), columns::CURRENCY, columns::COUNTRY),
            Err(DealError::InvalidArgument(_))
        ));
    }

    #[test]
    fn historical_picks_the_matching_aggregation() {
        let deals = fixture();
        let codes = CountryCodes::builtin();
        let dashboard = Dashboard::new(&deals, &codes, palette());
        let mut request = HistoryRequest {
            metrics: vec![columns::GROSS_MARGIN.into(), columns::EVA.into()],
            ..Default::default()
        };

        let everything = dashboard.historical(&DealFilter::all(), &request).unwrap();
        // D008 and D009 share 2024-05-05
        assert_eq!(9, everything.trend.len());
        assert_eq!(2, everything.traces.len());
        assert_eq!(DEFAULT_PALETTE[0], everything.traces[0].color);

        request.window = Some((date(2024, 2, 1), date(2024, 5, 5)));
        let window = dashboard.historical(&DealFilter::all(), &request).unwrap();
        assert_eq!(5, window.trend.len());

        request.business_lines = Some(["Markets".to_string()].into());
        let markets = dashboard.historical(&DealFilter::all(), &request).unwrap();
        assert_eq!(3, markets.trend.len());

        request.business_lines = Some(BTreeSet::new());
        let nothing = dashboard.historical(&DealFilter::all(), &request).unwrap();
        assert!(nothing.trend.is_empty());
        assert!(nothing.traces.iter().all(|t| t.x.is_empty()));
    }

    #[test]
    fn empty_selection_gives_empty_pages() {
        let deals = fixture();
        let codes = CountryCodes::builtin();
        let dashboard = Dashboard::new(&deals, &codes, palette());
        let filter = DealFilter {
            currencies: Some(BTreeSet::new()),
            ..Default::default()
        };
        let overview = dashboard.overview(&filter).unwrap();
        assert!(overview.kpis.iter().all(|k| k.value == 0.0 && k.trend.is_empty()));
        assert!(overview.settlement_durations.is_empty());
        assert!(overview.volume_by_country.is_empty());
    }
}
