//! Table formatting utilities for CLI output.

use comfy_table::{ContentArrangement, Table, presets};

/// Check results for a single file.
pub struct FileReport {
    /// File name as given on the command line.
    pub file: String,
    /// Message kind: `simple`, `complex` or `select`.
    pub shape: &'static str,
    /// Number of syntax errors.
    pub syntax_errors: usize,
    /// Number of validation errors.
    pub data_model_errors: usize,
}

impl FileReport {
    pub fn is_ok(&self) -> bool {
        self.syntax_errors == 0 && self.data_model_errors == 0
    }
}

/// Format check results as an ASCII table.
pub fn format_check_table(reports: &[FileReport]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_BORDERS_ONLY);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["File", "Message", "Syntax", "Validation", "Status"]);

    for report in reports {
        table.add_row(vec![
            report.file.clone(),
            report.shape.to_string(),
            report.syntax_errors.to_string(),
            report.data_model_errors.to_string(),
            if report.is_ok() { "ok" } else { "failed" }.to_string(),
        ]);
    }

    table
}
