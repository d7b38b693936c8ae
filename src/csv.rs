//! plan export: writes a [`PlanState`] out as a wide date-by-duty CSV,
//! adapted from the teacher's `assignments_to_csv` (date rows, one column
//! per place) to this crate's `date -> duty-form -> person` plan shape.

use std::collections::BTreeSet;
use std::error::Error;

use crate::model::duty::DutyCatalog;
use crate::model::plan::PlanState;

/// one row per date, one column per duty form that appears anywhere in the
/// plan; cells are blank where that duty was unfilled or not relevant.
pub fn plan_to_csv(plan: &PlanState, catalog: &DutyCatalog) -> Result<String, Box<dyn Error>> {
    let duties: BTreeSet<String> = catalog.all_forms().map(|f| f.id.to_string()).collect();

    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b',')
        .quote_style(csv::QuoteStyle::Necessary)
        .quote(b'"')
        .double_quote(false)
        .escape(b'\\')
        .from_writer(vec![]);

    let mut header = vec!["date".to_string()];
    header.extend(duties.iter().cloned());
    wtr.write_record(&header)?;

    for &date in plan.dates() {
        let mut row = vec![date.to_string()];
        for duty in &duties {
            let person = plan
                .duties_on(date)
                .find(|(d, _)| d.as_str() == duty)
                .map(|(_, p)| p.to_string())
                .unwrap_or_default();
            row.push(person);
        }
        wtr.write_record(&row)?;
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}
