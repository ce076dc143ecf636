use prospector_backend_client::SearchResult;
use prospector_backend_client::types::ProspectListSummary;
use prospector_core::CanonicalFilter;
use prospector_core::FilterCategory;
use prospector_core::records::CompanyRow;
use prospector_core::records::PersonRow;
use prospector_core::records::to_text;

const EMPTY_CELL: &str = "-";

pub(crate) fn format_results(results: &SearchResult) -> String {
    if results.is_empty() {
        return "No results.".to_string();
    }

    let companies: Vec<[String; 4]> = results
        .companies
        .iter()
        .map(CompanyRow::from_record)
        .map(|row| [row.name, row.industry, row.size, row.location])
        .collect();
    let people: Vec<[String; 4]> = results
        .people
        .iter()
        .map(PersonRow::from_record)
        .map(|row| [row.name, row.title, row.company, row.email])
        .collect();

    let mut sections = Vec::new();
    if !companies.is_empty() {
        sections.push(format!(
            "Companies ({})\n{}",
            companies.len(),
            table(["Name", "Industry", "Size", "Location"], &companies)
        ));
    }
    if !people.is_empty() {
        sections.push(format!(
            "People ({})\n{}",
            people.len(),
            table(["Name", "Title", "Company", "Email"], &people)
        ));
    }
    sections.join("\n\n")
}

pub(crate) fn format_prospect_lists(lists: &[ProspectListSummary]) -> String {
    if lists.is_empty() {
        return "No lists yet.".to_string();
    }
    let rows: Vec<[String; 3]> = lists
        .iter()
        .map(|list| {
            let summary = list.summary.as_ref().map(to_text).unwrap_or_default();
            [
                list.id.clone(),
                list.created_at.clone().unwrap_or_default(),
                if summary.is_empty() {
                    "Prospect list".to_string()
                } else {
                    summary
                },
            ]
        })
        .collect();
    table(["Id", "Created", "Summary"], &rows)
}

/// One line per category that has tokens, e.g. `industry: SaaS, Fintech`.
pub(crate) fn format_filter(filter: &CanonicalFilter) -> String {
    if filter.is_unfiltered() {
        return format!("No filters (limit {}).", filter.limit);
    }
    let mut lines: Vec<String> = FilterCategory::ALL
        .iter()
        .filter(|category| !filter.tokens(**category).is_empty())
        .map(|category| format!("{category}: {}", filter.tokens(*category).join(", ")))
        .collect();
    lines.push(format!("limit: {}", filter.limit));
    lines.join("\n")
}

fn table<const N: usize>(headers: [&str; N], rows: &[[String; N]]) -> String {
    let mut widths = headers.map(|header| header.chars().count());
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(display_cell(cell).chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(format_row(headers.iter().copied(), &widths));
    for row in rows {
        lines.push(format_row(
            row.iter().map(String::as_str).map(display_cell),
            &widths,
        ));
    }
    lines.join("\n")
}

fn format_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    padded.join("  ").trim_end().to_string()
}

fn display_cell(cell: &str) -> &str {
    if cell.is_empty() { EMPTY_CELL } else { cell }
}
