//! Group, aggregate, sort and truncate deal tables into chart ready shapes.
//!
//! Every function here is pure: it reads the input table, never modifies it,
//! and returns a freshly built result. Referenced columns are checked before
//! any row is looked at, so a misspelt column fails even on an empty table.
//! Empty inputs are never an error, they produce empty results.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{Datelike, NaiveDate};

use crate::deal::columns;
use crate::error::{DealError, DealResult};
use crate::geo::CountryCodeLookup;
use crate::table::{Table, Value, date_cell, numeric_cell};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// English name of a month number in `1..=12`
pub fn month_name(month: u32) -> Option<&'static str> {
    MONTH_NAMES.get(month.checked_sub(1)? as usize).copied()
}

/// Distinct groups in first seen order, with one running sum per measure
struct Grouped {
    keys: Vec<Vec<Value>>,
    sums: Vec<Vec<f64>>,
}

impl Grouped {
    fn into_table(self, key_columns: &[&str], measures: &[&str]) -> DealResult<Table> {
        let mut table = Table::new(key_columns.iter().chain(measures).copied());
        for (key, sums) in self.keys.into_iter().zip(self.sums) {
            let mut row = key;
            row.extend(sums.into_iter().map(Value::Number));
            table.push_row(row)?;
        }
        Ok(table)
    }

    fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&(Vec<Value>, Vec<f64>), &(Vec<Value>, Vec<f64>)) -> std::cmp::Ordering,
    {
        let mut pairs: Vec<_> = std::mem::take(&mut self.keys)
            .into_iter()
            .zip(std::mem::take(&mut self.sums))
            .collect();
        // sort_by is stable, ties keep their first seen order
        pairs.sort_by(|a, b| compare(a, b));
        let (keys, sums) = pairs.into_iter().unzip();
        self.keys = keys;
        self.sums = sums;
    }
}

/// Walk the table once, grouping every row for which `key_of` yields a key.
fn accumulate<F>(table: &Table, measures: &[(usize, &str)], mut key_of: F) -> DealResult<Grouped>
where
    F: FnMut(usize, &[Value]) -> DealResult<Option<Vec<Value>>>,
{
    let mut slots: HashMap<Vec<Value>, usize> = HashMap::new();
    let mut grouped = Grouped {
        keys: Vec::new(),
        sums: Vec::new(),
    };

    for (row_no, row) in table.rows().iter().enumerate() {
        let Some(key) = key_of(row_no, row.as_slice())? else {
            continue;
        };
        let slot = match slots.get(&key) {
            Some(slot) => *slot,
            None => {
                let slot = grouped.keys.len();
                slots.insert(key.clone(), slot);
                grouped.keys.push(key);
                grouped.sums.push(vec![0.0; measures.len()]);
                slot
            }
        };
        for (m, (idx, name)) in measures.iter().enumerate() {
            if let Some(v) = numeric_cell(&row[*idx], name, row_no)? {
                grouped.sums[slot][m] += v;
            }
        }
    }
    Ok(grouped)
}

fn names<S: AsRef<str>>(names: &[S]) -> Vec<&str> {
    names.iter().map(AsRef::as_ref).collect()
}

fn measure_slots<'a>(table: &Table, measures: &[&'a str]) -> DealResult<Vec<(usize, &'a str)>> {
    let idx = table.column_indices(measures)?;
    Ok(idx.into_iter().zip(measures.iter().copied()).collect())
}

/// Sum `measures` per distinct combination of `group_keys`.
///
/// The result holds the key columns followed by the measure columns, one row
/// per group in the order the groups first appear in `table`.
pub fn sum_by<K, M>(table: &Table, group_keys: &[K], measures: &[M]) -> DealResult<Table>
where
    K: AsRef<str>,
    M: AsRef<str>,
{
    let keys = names(group_keys);
    let measures = names(measures);

    let mut all = keys.clone();
    all.extend(&measures);
    table.column_indices(&all)?;

    if keys.is_empty() {
        return Err(DealError::InvalidArgument(
            "sum_by needs at least one group key".into(),
        ));
    }

    let key_idx = table.column_indices(&keys)?;
    let slots = measure_slots(table, &measures)?;
    let grouped = accumulate(table, &slots, |_, row| {
        Ok(Some(key_idx.iter().map(|i| row[*i].clone()).collect()))
    })?;

    log::debug!(
        "sum_by {:?} over {} rows: {} groups",
        keys,
        table.len(),
        grouped.keys.len()
    );
    grouped.into_table(&keys, &measures)
}

/// Sum `measure` per `group_key`, sort ascending by the sum and keep the first `n` groups.
///
/// Ascending order means these are the `n` groups with the *smallest* sums.
/// This is what the investor league table has always shown, even though it
/// is titled "top". Ties keep their first seen order. An `n` larger than the
/// number of groups returns every group.
pub fn top_n(table: &Table, group_key: &str, measure: &str, n: usize) -> DealResult<Table> {
    table.column_indices(&[group_key, measure])?;
    if n == 0 {
        return Err(DealError::InvalidArgument("top_n needs n >= 1".into()));
    }

    let key_idx = table.column_index(group_key)?;
    let slots = measure_slots(table, &[measure])?;
    let mut grouped = accumulate(table, &slots, |_, row| Ok(Some(vec![row[key_idx].clone()])))?;
    grouped.sort_by(|a, b| a.1[0].total_cmp(&b.1[0]));
    grouped.keys.truncate(n);
    grouped.sums.truncate(n);

    grouped.into_table(&[group_key], &[measure])
}

/// Sum `measure` per calendar month of the signing date.
///
/// Columns are `signingMonthNum`, `signingMonth` and the measure. Rows follow
/// the month number, so January always comes before December no matter how
/// the names would sort. Rows without a signing date are left out.
pub fn month_bucketed_sum(table: &Table, measure: &str) -> DealResult<Table> {
    table.column_indices(&[columns::SIGNING_DATE, measure])?;

    let date_idx = table.column_index(columns::SIGNING_DATE)?;
    let slots = measure_slots(table, &[measure])?;
    let mut grouped = accumulate(table, &slots, |row_no, row| {
        let Some(date) = date_cell(&row[date_idx], columns::SIGNING_DATE, row_no)? else {
            return Ok(None);
        };
        let month = date.month();
        let name = month_name(month).unwrap_or_default();
        Ok(Some(vec![Value::Int(month as i64), Value::from(name)]))
    })?;
    grouped.sort_by(|a, b| month_key(&a.0).cmp(&month_key(&b.0)));

    grouped.into_table(
        &[columns::SIGNING_MONTH_NUM, columns::SIGNING_MONTH],
        &[measure],
    )
}

fn month_key(key: &[Value]) -> i64 {
    match key.first() {
        Some(Value::Int(m)) => *m,
        _ => 0,
    }
}

/// Days between signing and settlement for every row, as an absolute value.
///
/// Rows where either date is missing have no duration and are left out.
pub fn duration_distribution(table: &Table) -> DealResult<Vec<i64>> {
    let idx = table.column_indices(&[columns::SIGNING_DATE, columns::SETTLEMENT_DATE])?;
    let (signing, settlement) = (idx[0], idx[1]);

    let mut durations = Vec::with_capacity(table.len());
    for (row_no, row) in table.rows().iter().enumerate() {
        let signed = date_cell(&row[signing], columns::SIGNING_DATE, row_no)?;
        let settled = date_cell(&row[settlement], columns::SETTLEMENT_DATE, row_no)?;
        if let (Some(signed), Some(settled)) = (signed, settled) {
            durations.push((settled - signed).num_days().abs());
        }
    }
    Ok(durations)
}

/// Labels and summed values of one measure over a shared group axis
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub measure: String,
    pub labels: Vec<Value>,
    pub values: Vec<f64>,
}

/// One [`Series`] per measure, in the order the measures were requested
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pivot {
    series: Vec<Series>,
}

impl Pivot {
    pub fn get(&self, measure: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.measure == measure)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Series> {
        self.series.iter()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Group by `group_key` once and split the sums into one series per measure.
///
/// Labels are in order of first appearance, not sorted.
pub fn pivot_measures<M: AsRef<str>>(
    table: &Table,
    group_key: &str,
    measures: &[M],
) -> DealResult<Pivot> {
    let measures = names(measures);
    let mut all = vec![group_key];
    all.extend(&measures);
    table.column_indices(&all)?;

    let key_idx = table.column_index(group_key)?;
    let slots = measure_slots(table, &measures)?;
    let grouped = accumulate(table, &slots, |_, row| Ok(Some(vec![row[key_idx].clone()])))?;

    let labels: Vec<Value> = grouped
        .keys
        .into_iter()
        .map(|mut k| k.swap_remove(0))
        .collect();
    let series = measures
        .iter()
        .enumerate()
        .map(|(m, name)| Series {
            measure: name.to_string(),
            labels: labels.clone(),
            values: grouped.sums.iter().map(|s| s[m]).collect(),
        })
        .collect();
    Ok(Pivot { series })
}

/// optional restrictions applied before summing per day
struct DayFilter<'a> {
    range: Option<(NaiveDate, NaiveDate)>,
    category: Option<(&'a str, &'a BTreeSet<String>)>,
}

fn dated_sum(table: &Table, date_column: &str, measures: &[&str], filter: DayFilter<'_>) -> DealResult<Table> {
    let mut all = vec![date_column];
    if let Some((category_column, _)) = filter.category {
        all.push(category_column);
    }
    all.extend(measures);
    table.column_indices(&all)?;

    let date_idx = table.column_index(date_column)?;
    let category = match filter.category {
        Some((column, allowed)) => Some((table.column_index(column)?, allowed)),
        None => None,
    };
    let slots = measure_slots(table, measures)?;

    let mut grouped = accumulate(table, &slots, |row_no, row| {
        let Some(date) = date_cell(&row[date_idx], date_column, row_no)? else {
            return Ok(None);
        };
        if let Some((start, end)) = filter.range {
            if date < start || date > end {
                return Ok(None);
            }
        }
        if let Some((idx, allowed)) = category {
            match row[idx].as_str() {
                Some(value) if allowed.contains(value) => {}
                _ => return Ok(None),
            }
        }
        Ok(Some(vec![Value::Date(date)]))
    })?;
    grouped.sort_by(|a, b| a.0[0].as_date().cmp(&b.0[0].as_date()));

    grouped.into_table(&[date_column], measures)
}

/// Sum `measures` per day of `date_column`, in date order
pub fn daily_sum<M: AsRef<str>>(table: &Table, date_column: &str, measures: &[M]) -> DealResult<Table> {
    let measures = names(measures);
    dated_sum(
        table,
        date_column,
        &measures,
        DayFilter {
            range: None,
            category: None,
        },
    )
}

/// Sum `measures` per day for rows with `start <= date_column <= end`.
///
/// This is the contract without a category filter, every category in the
/// range is kept.
pub fn range_sum<M: AsRef<str>>(
    table: &Table,
    date_column: &str,
    start: NaiveDate,
    end: NaiveDate,
    measures: &[M],
) -> DealResult<Table> {
    let measures = names(measures);
    dated_sum(
        table,
        date_column,
        &measures,
        DayFilter {
            range: Some((start, end)),
            category: None,
        },
    )
}

/// Like [`range_sum`] but only rows whose `category_column` is in `allowed` are kept.
///
/// An empty `allowed` set matches nothing. To keep every category call
/// [`range_sum`] instead.
pub fn filtered_range_sum<M: AsRef<str>>(
    table: &Table,
    date_column: &str,
    start: NaiveDate,
    end: NaiveDate,
    category_column: &str,
    allowed: &BTreeSet<String>,
    measures: &[M],
) -> DealResult<Table> {
    let measures = names(measures);
    dated_sum(
        table,
        date_column,
        &measures,
        DayFilter {
            range: Some((start, end)),
            category: Some((category_column, allowed)),
        },
    )
}

/// Headline value of a KPI card: the plain sum of `measure`
pub fn total(table: &Table, measure: &str) -> DealResult<f64> {
    let idx = table.column_index(measure)?;
    let mut sum = 0.0;
    for (row_no, row) in table.rows().iter().enumerate() {
        if let Some(v) = numeric_cell(&row[idx], measure, row_no)? {
            sum += v;
        }
    }
    Ok(sum)
}

/// Sum `measure` per country, together with the country's ISO alpha-3 code.
///
/// Columns are `country_column`, `isoCode` and the measure. A country the
/// lookup does not know keeps its row with a null code.
pub fn geo_sum(
    table: &Table,
    country_column: &str,
    measure: &str,
    lookup: &dyn CountryCodeLookup,
) -> DealResult<Table> {
    table.column_indices(&[country_column, measure])?;

    let country_idx = table.column_index(country_column)?;
    let slots = measure_slots(table, &[measure])?;
    let mut unmapped = BTreeSet::new();
    let grouped = accumulate(table, &slots, |_, row| {
        let country = &row[country_idx];
        let code = match country.as_str() {
            Some(name) => match lookup.iso_code(name) {
                Some(code) => Value::from(code),
                None => {
                    unmapped.insert(name.to_string());
                    Value::Null
                }
            },
            None => Value::Null,
        };
        Ok(Some(vec![country.clone(), code]))
    })?;

    if !unmapped.is_empty() {
        log::warn!("no country code for {:?}", unmapped);
    }
    grouped.into_table(&[country_column, columns::ISO_CODE], &[measure])
}

/// Distinct values of a column in first seen order, e.g. the choices of a filter
pub fn distinct_values(table: &Table, column: &str) -> DealResult<Vec<Value>> {
    let mut seen = HashSet::new();
    Ok(table
        .column(column)?
        .filter(|v| seen.insert(*v))
        .cloned()
        .collect())
}
