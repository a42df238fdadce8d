use std::io::Write;

use crate::aggregate::Pivot;
use crate::dashboard::{Historical, LeagueTable, Overview, Trace, Ventilation};
use crate::deal::columns;
use crate::error::DealResult;
use crate::table::{Table, Value};

/// A page flattened into titled tables, the way the renderer binds to it
pub trait Sections {
    fn sections(&self) -> DealResult<Vec<(String, Table)>>;
}

/// label/color pairs of a set of traces
fn legend(traces: &[Trace]) -> DealResult<Table> {
    let mut table = Table::new(["series", "color"]);
    for trace in traces {
        table.push_row(vec![trace.name.as_str().into(), trace.color.as_str().into()])?;
    }
    Ok(table)
}

/// traces sharing one x axis, one column per trace
fn traces_table(x_name: &str, traces: &[Trace]) -> DealResult<Table> {
    let mut table = Table::new(std::iter::once(x_name).chain(traces.iter().map(|t| t.name.as_str())));
    let rows = traces.first().map_or(0, |t| t.x.len());
    for i in 0..rows {
        let mut row = vec![traces[0].x[i].clone()];
        row.extend(traces.iter().map(|t| Value::Number(t.y[i])));
        table.push_row(row)?;
    }
    Ok(table)
}

fn pivot_table(by: &str, pivot: &Pivot) -> DealResult<Table> {
    let mut table = Table::new(std::iter::once(by).chain(pivot.iter().map(|s| s.measure.as_str())));
    let labels = pivot.iter().next().map(|s| s.labels.as_slice()).unwrap_or_default();
    for (i, label) in labels.iter().enumerate() {
        let mut row = vec![label.clone()];
        row.extend(pivot.iter().map(|s| Value::Number(s.values[i])));
        table.push_row(row)?;
    }
    Ok(table)
}

impl Sections for Overview {
    fn sections(&self) -> DealResult<Vec<(String, Table)>> {
        let mut kpis = Table::new(["kpi", "measure", "value"]);
        for kpi in &self.kpis {
            kpis.push_row(vec![kpi.label.into(), kpi.measure.into(), kpi.value.into()])?;
        }
        let mut sections = vec![("kpis".to_string(), kpis)];
        for kpi in &self.kpis {
            sections.push((format!("trend {}", kpi.measure), kpi.trend.clone()));
        }

        let mut durations = Table::new([columns::SIGNING_TO_SETTLEMENT]);
        for days in &self.settlement_durations {
            durations.push_row(vec![Value::Int(*days)])?;
        }

        sections.extend([
            ("volume by product".to_string(), self.volume_by_product.clone()),
            (
                "fees over time".to_string(),
                traces_table(columns::SIGNING_DATE, &self.fees_over_time)?,
            ),
            ("fees legend".to_string(), legend(&self.fees_over_time)?),
            (
                "rwa by product".to_string(),
                traces_table(columns::PRODUCT_NAME, &self.rwa_by_product)?,
            ),
            ("rwa legend".to_string(), legend(&self.rwa_by_product)?),
            ("signing to settlement".to_string(), durations),
            ("volume by country".to_string(), self.volume_by_country.clone()),
        ]);
        Ok(sections)
    }
}

impl Sections for LeagueTable {
    fn sections(&self) -> DealResult<Vec<(String, Table)>> {
        Ok(vec![(format!("investors by {}", self.measure), self.investors.clone())])
    }
}

impl Sections for Ventilation {
    fn sections(&self) -> DealResult<Vec<(String, Table)>> {
        Ok(vec![
            (
                format!("metrics by {}", self.by),
                pivot_table(&self.by, &self.distribution)?,
            ),
            (
                "by business line and region".to_string(),
                self.by_line_and_region.clone(),
            ),
        ])
    }
}

impl Sections for Historical {
    fn sections(&self) -> DealResult<Vec<(String, Table)>> {
        Ok(vec![
            ("trend".to_string(), self.trend.clone()),
            ("trend legend".to_string(), legend(&self.traces)?),
        ])
    }
}

/// Write every section as a `# title` line, a header row and the data rows
pub fn write_sections<W: Write>(page: &dyn Sections, writer: W) -> DealResult<()> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    for (title, table) in page.sections()? {
        wtr.write_record([format!("# {title}")])?;
        wtr.write_record(table.columns())?;
        for row in table.rows() {
            wtr.write_record(row.iter().map(|v| v.to_string()))?;
        }
    }
    wtr.flush()?;
    Ok(())
}

pub fn print_sections(page: &dyn Sections) -> DealResult<()> {
    let stdout = std::io::stdout();
    write_sections(page, stdout.lock())
}
