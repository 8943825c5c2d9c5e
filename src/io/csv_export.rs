use std::path::Path;

use crate::error::{Result, RoadmapError};
use crate::layout::roadmap::DeliverySection;
use crate::model::PastDelivery;

/// Write the delivery recap as a semicolon-delimited CSV.
///
/// Columns: Category ; Task ; End Date ; Period
/// Dates are formatted as DD/MM/YYYY. Past deliveries come first, marked
/// `past`, then the roadmap sections in category order.
/// Returns the number of data rows written.
pub fn export_delivery_summary<W: std::io::Write>(
    sections: &[DeliverySection],
    past: &[PastDelivery],
    writer: W,
) -> Result<usize> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record(["Category", "Task", "End Date", "Period"])?;

    let mut rows = 0usize;
    for delivery in past {
        wtr.write_record([
            delivery.category.as_str(),
            delivery.name.as_str(),
            delivery.end_label().as_str(),
            "past",
        ])?;
        rows += 1;
    }
    for section in sections {
        for line in &section.lines {
            wtr.write_record([
                section.category.name.as_str(),
                line.name.as_str(),
                line.end_date.format("%d/%m/%Y").to_string().as_str(),
                "roadmap",
            ])?;
            rows += 1;
        }
    }

    wtr.flush().map_err(csv::Error::from)?;
    Ok(rows)
}

/// Same as [`export_delivery_summary`], into a file.
pub fn export_delivery_summary_to(
    sections: &[DeliverySection],
    past: &[PastDelivery],
    path: &Path,
) -> Result<usize> {
    let file = std::fs::File::create(path).map_err(|e| RoadmapError::io(path, e))?;
    export_delivery_summary(sections, past, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::roadmap::DeliveryLine;
    use crate::model::Category;
    use chrono::NaiveDate;

    #[test]
    fn writes_past_then_sections() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        let sections = vec![DeliverySection {
            category: Category::new("pac", "PAC"),
            lines: vec![DeliveryLine {
                id: "t1".into(),
                name: "Accompagnement HLM".into(),
                end_date: d(2026, 6, 30),
            }],
        }];
        let past = vec![PastDelivery {
            id: "old".into(),
            name: "Rapports lot 2".into(),
            category: "rapports".into(),
            end_date: d(2025, 11, 14),
            status: "complete".into(),
        }];

        let mut out = Vec::new();
        let rows = export_delivery_summary(&sections, &past, &mut out).unwrap();
        assert_eq!(rows, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Category;Task;End Date;Period");
        assert_eq!(lines[1], "rapports;Rapports lot 2;14/11/2025;past");
        assert_eq!(lines[2], "PAC;Accompagnement HLM;30/06/2026;roadmap");
    }
}
