use std::fs::File;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::Reader;
use serde::{Deserialize, Deserializer};

use crate::deal::Deal;
use crate::error::{DealError, DealResult};

/// One row of the deal file.
///
/// Deal exports come with either compact camel case headers (`productVolume`)
/// or spaced title case headers (`Product Volume`). Both spellings land on the
/// same field here, nothing past this struct knows about the second convention.
#[derive(Debug, Deserialize)]
pub struct Input {
    #[serde(rename = "dealId", alias = "Deal Id", default)]
    deal_id: Option<String>,

    #[serde(rename = "reportingDate", alias = "Reporting Date", default, deserialize_with = "date")]
    reporting_date: Option<NaiveDate>,
    #[serde(rename = "signingDate", alias = "Signing Date", default, deserialize_with = "date")]
    signing_date: Option<NaiveDate>,
    #[serde(rename = "settlementDate", alias = "Settlement Date", default, deserialize_with = "date")]
    settlement_date: Option<NaiveDate>,

    #[serde(rename = "businessLine", alias = "Business Line", default)]
    business_line: Option<String>,
    #[serde(rename = "productLine", alias = "Product Line", default)]
    product_line: Option<String>,
    #[serde(rename = "productName", alias = "Product Name", default)]
    product_name: Option<String>,
    #[serde(alias = "Currency", default)]
    currency: Option<String>,
    #[serde(alias = "Country", default)]
    country: Option<String>,
    #[serde(rename = "investorName", alias = "Investor Name", default)]
    investor_name: Option<String>,
    #[serde(alias = "Region", default)]
    region: Option<String>,

    /// These are money amounts, but f64 is what the charts consume
    #[serde(rename = "productVolume", alias = "Product Volume", default)]
    product_volume: Option<f64>,
    #[serde(rename = "upfrontFees", alias = "Upfront Fees", default)]
    upfront_fees: Option<f64>,
    #[serde(rename = "upfrontFeesSkim", alias = "Upfront Fees Skim", default)]
    upfront_fees_skim: Option<f64>,
    #[serde(rename = "grossMargin", alias = "Gross Margin", default)]
    gross_margin: Option<f64>,
    #[serde(rename = "netMargin", alias = "Net Margin", default)]
    net_margin: Option<f64>,
    #[serde(alias = "Eva", default)]
    eva: Option<f64>,
    #[serde(rename = "rwaSpot", alias = "Rwa Spot", default)]
    rwa_spot: Option<f64>,
    #[serde(rename = "rwaHtm", alias = "Rwa Htm", default)]
    rwa_htm: Option<f64>,
    #[serde(rename = "rwaRelease", alias = "Rwa Release", default)]
    rwa_release: Option<f64>,
}

impl From<Input> for Deal {
    fn from(input: Input) -> Self {
        Deal {
            deal_id: non_blank(input.deal_id),
            reporting_date: input.reporting_date,
            signing_date: input.signing_date,
            settlement_date: input.settlement_date,
            business_line: non_blank(input.business_line),
            product_line: non_blank(input.product_line),
            product_name: non_blank(input.product_name),
            currency: non_blank(input.currency),
            country: non_blank(input.country),
            investor_name: non_blank(input.investor_name),
            region: non_blank(input.region),
            product_volume: input.product_volume,
            upfront_fees: input.upfront_fees,
            upfront_fees_skim: input.upfront_fees_skim,
            gross_margin: input.gross_margin,
            net_margin: input.net_margin,
            eva: input.eva,
            rwa_spot: input.rwa_spot,
            rwa_htm: input.rwa_htm,
            rwa_release: input.rwa_release,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Parse a date cell, accepting a plain date or a timestamp whose time part is dropped
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
                .ok()
                .map(|dt| dt.date())
        })
}

fn date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_date(s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{s}'"))),
    }
}

pub fn create_input_deserializer<P: AsRef<Path>>(
    pathname: P,
    delimiter: u8,
) -> DealResult<Reader<File>> {
    let file = File::open(pathname)?;

    let rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(file);
    Ok(rdr)
}

/// Read every deal of a file.
///
/// Rows that fail to parse are logged and skipped, unless `strict` is set in
/// which case the first bad row aborts the load.
pub fn load_deals<P: AsRef<Path>>(pathname: P, delimiter: u8, strict: bool) -> DealResult<Vec<Deal>> {
    let pathname = pathname.as_ref();
    let mut rdr = create_input_deserializer(pathname, delimiter)?;

    let mut deals = Vec::new();
    let mut skipped = 0usize;
    for (idx, row) in rdr.deserialize::<Input>().enumerate() {
        match row {
            Ok(input) => deals.push(Deal::from(input)),
            Err(e) if strict => return Err(DealError::Csv(e)),
            Err(e) => {
                // header is line 1, first record line 2
                log::warn!("skipping malformed deal on line {}: {}", idx + 2, e);
                skipped += 1;
            }
        }
    }
    log::info!(
        "loaded {} deals from {} ({} skipped)",
        deals.len(),
        pathname.display(),
        skipped
    );
    Ok(deals)
}
