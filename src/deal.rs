use chrono::NaiveDate;

use crate::error::DealResult;
use crate::table::{Table, Value};

/// Canonical column names of the deal table
pub mod columns {
    pub const DEAL_ID: &str = "dealId";
    pub const REPORTING_DATE: &str = "reportingDate";
    pub const SIGNING_DATE: &str = "signingDate";
    pub const SETTLEMENT_DATE: &str = "settlementDate";
    pub const BUSINESS_LINE: &str = "businessLine";
    pub const PRODUCT_LINE: &str = "productLine";
    pub const PRODUCT_NAME: &str = "productName";
    pub const CURRENCY: &str = "currency";
    pub const COUNTRY: &str = "country";
    pub const INVESTOR_NAME: &str = "investorName";
    pub const REGION: &str = "region";
    pub const PRODUCT_VOLUME: &str = "productVolume";
    pub const UPFRONT_FEES: &str = "upfrontFees";
    pub const UPFRONT_FEES_SKIM: &str = "upfrontFeesSkim";
    pub const GROSS_MARGIN: &str = "grossMargin";
    pub const NET_MARGIN: &str = "netMargin";
    pub const EVA: &str = "eva";
    pub const RWA_SPOT: &str = "rwaSpot";
    pub const RWA_HTM: &str = "rwaHtm";
    pub const RWA_RELEASE: &str = "rwaRelease";

    // derived by the aggregation engine
    pub const SIGNING_MONTH_NUM: &str = "signingMonthNum";
    pub const SIGNING_MONTH: &str = "signingMonth";
    pub const SIGNING_TO_SETTLEMENT: &str = "signingToSettlement";
    pub const ISO_CODE: &str = "isoCode";

    /// every column of a table built by [`super::deals_to_table`], in order
    pub const ALL: [&str; 20] = [
        DEAL_ID,
        REPORTING_DATE,
        SIGNING_DATE,
        SETTLEMENT_DATE,
        BUSINESS_LINE,
        PRODUCT_LINE,
        PRODUCT_NAME,
        CURRENCY,
        COUNTRY,
        INVESTOR_NAME,
        REGION,
        PRODUCT_VOLUME,
        UPFRONT_FEES,
        UPFRONT_FEES_SKIM,
        GROSS_MARGIN,
        NET_MARGIN,
        EVA,
        RWA_SPOT,
        RWA_HTM,
        RWA_RELEASE,
    ];

    /// measures a user can pick for league tables and KPI cards
    pub const HEADLINE_MEASURES: [&str; 5] =
        [GROSS_MARGIN, PRODUCT_VOLUME, EVA, NET_MARGIN, UPFRONT_FEES];

    pub fn is_measure(name: &str) -> bool {
        matches!(
            name,
            PRODUCT_VOLUME
                | UPFRONT_FEES
                | UPFRONT_FEES_SKIM
                | GROSS_MARGIN
                | NET_MARGIN
                | EVA
                | RWA_SPOT
                | RWA_HTM
                | RWA_RELEASE
        )
    }
}

/// A single structured finance deal, in the canonical schema
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Deal {
    pub deal_id: Option<String>,
    pub reporting_date: Option<NaiveDate>,
    pub signing_date: Option<NaiveDate>,
    pub settlement_date: Option<NaiveDate>,

    pub business_line: Option<String>,
    pub product_line: Option<String>,
    pub product_name: Option<String>,
    pub currency: Option<String>,
    pub country: Option<String>,
    pub investor_name: Option<String>,
    pub region: Option<String>,

    /// Missing measures stay `None` and are skipped when summing
    pub product_volume: Option<f64>,
    pub upfront_fees: Option<f64>,
    pub upfront_fees_skim: Option<f64>,
    pub gross_margin: Option<f64>,
    pub net_margin: Option<f64>,
    pub eva: Option<f64>,
    pub rwa_spot: Option<f64>,
    pub rwa_htm: Option<f64>,
    pub rwa_release: Option<f64>,
}

impl Deal {
    fn into_row(self) -> Vec<Value> {
        vec![
            self.deal_id.into(),
            self.reporting_date.into(),
            self.signing_date.into(),
            self.settlement_date.into(),
            self.business_line.into(),
            self.product_line.into(),
            self.product_name.into(),
            self.currency.into(),
            self.country.into(),
            self.investor_name.into(),
            self.region.into(),
            self.product_volume.into(),
            self.upfront_fees.into(),
            self.upfront_fees_skim.into(),
            self.gross_margin.into(),
            self.net_margin.into(),
            self.eva.into(),
            self.rwa_spot.into(),
            self.rwa_htm.into(),
            self.rwa_release.into(),
        ]
    }
}

/// Build the canonical deal table, columns as in [`columns::ALL`]
pub fn deals_to_table<'a>(deals: impl IntoIterator<Item = &'a Deal>) -> DealResult<Table> {
    let mut table = Table::new(columns::ALL);
    for deal in deals {
        table.push_row(deal.clone().into_row())?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_one_row_per_deal() {
        let deal = Deal {
            deal_id: Some("D1".into()),
            product_volume: Some(10.0),
            ..Default::default()
        };
        let table = deals_to_table(&[deal.clone(), deal]).unwrap();

        assert_eq!(2, table.len());
        assert_eq!(columns::ALL.len(), table.columns().len());
        assert_eq!(
            Some(&Value::Number(10.0)),
            table.get(1, columns::PRODUCT_VOLUME)
        );
        assert_eq!(Some(&Value::Null), table.get(0, columns::EVA));
    }

    #[test]
    fn measures_are_recognised() {
        assert!(columns::is_measure("rwaHtm"));
        assert!(!columns::is_measure("country"));
    }
}
