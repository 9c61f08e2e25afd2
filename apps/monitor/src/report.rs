use crate::history::HistoryRow;

const GREEN: &str = "\x1b[92m";
const RED: &str = "\x1b[91m";
const RESET: &str = "\x1b[0m";

/// Render probe observations as a human-readable table.
///
/// Column widths adapt to the longest cell; failed probes render as a
/// red DOWN row with the error text appended.
pub fn render(rows: &[HistoryRow]) -> String {
    if rows.is_empty() {
        return "No results to display".to_owned();
    }

    let name_width = column_width("ENDPOINT", rows.iter().map(|row| row.name.len()));
    let url_width = column_width("URL", rows.iter().map(|row| row.url.len()));
    let status_width = "STATUS".len();
    let latency_width = "RESPONSE TIME (ms)".len();

    let mut table = String::new();
    table.push_str(&format!(
        "{:<name_width$} {:<url_width$} {:<status_width$} {:<latency_width$} TIMESTAMP\n",
        "ENDPOINT", "URL", "STATUS", "RESPONSE TIME (ms)",
    ));
    table.push_str(&"-".repeat(name_width + url_width + status_width + latency_width + 50));
    table.push('\n');

    for row in rows {
        let (label, color) = if row.is_available { ("UP", GREEN) } else { ("DOWN", RED) };
        let latency =
            row.response_time_ms.map_or_else(|| "N/A".to_owned(), |ms| ms.to_string());

        table.push_str(&format!(
            "{name:<name_width$} {url:<url_width$} {color}{label:<status_width$}{RESET} {latency:<latency_width$} {timestamp}",
            name = row.name,
            url = row.url,
            timestamp = row.timestamp,
        ));
        if let Some(error) = &row.error {
            table.push_str(&format!(" ({error})"));
        }
        table.push('\n');
    }

    table
}

fn column_width(header: &str, cells: impl Iterator<Item = usize>) -> usize {
    cells.fold(header.len(), usize::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn up_row() -> HistoryRow {
        HistoryRow {
            name: "api".into(),
            url: "https://example.com/health".into(),
            timestamp: "2026-08-08T10:00:00+00:00".into(),
            status_code: Some(200),
            response_time_ms: Some(52.31),
            is_available: true,
            error: None,
        }
    }

    fn down_row() -> HistoryRow {
        HistoryRow {
            name: "worker".into(),
            url: "https://example.org".into(),
            timestamp: "2026-08-08T10:00:00+00:00".into(),
            status_code: None,
            response_time_ms: None,
            is_available: false,
            error: Some("request timed out after 5s".into()),
        }
    }

    #[test]
    fn empty_input_renders_a_placeholder() {
        assert_eq!(render(&[]), "No results to display");
    }

    #[test]
    fn available_rows_render_up_with_latency() {
        let table = render(&[up_row()]);

        assert!(table.contains("ENDPOINT"));
        assert!(table.contains(&format!("{GREEN}UP")));
        assert!(table.contains("52.31"));
    }

    #[test]
    fn failed_rows_render_down_with_the_error() {
        let table = render(&[down_row()]);

        assert!(table.contains(&format!("{RED}DOWN")));
        assert!(table.contains("N/A"));
        assert!(table.contains("(request timed out after 5s)"));
    }

    #[test]
    fn columns_widen_to_the_longest_cell() {
        let table = render(&[up_row(), down_row()]);
        let lines: Vec<&str> = table.lines().collect();

        // Both data rows place the URL column at the same offset.
        let header = lines[0];
        let url_offset = header.find("URL").unwrap();
        assert!(lines[2].len() > url_offset);
        assert_eq!(&lines[2][url_offset..url_offset + 4], "http");
        assert_eq!(&lines[3][url_offset..url_offset + 4], "http");
    }
}
