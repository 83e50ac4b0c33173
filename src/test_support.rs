//! Writes small `.xlsx` packages for tests.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Builds a minimal workbook: one part per sheet, inline strings for text.
#[derive(Default)]
pub(crate) struct WorkbookBuilder {
    /// `(sheet name, worksheet xml)`
    sheets: Vec<(String, String)>,
    /// Merged ranges of the sheet being built
    merges: Vec<String>,
    /// Extra package parts
    parts: Vec<(String, String)>,
}

impl WorkbookBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds a sheet; an empty string leaves the cell out, numbers are stored as numbers.
    pub(crate) fn sheet(mut self, name: &str, rows: &[&[&str]]) -> Self {
        self.flush_merges();
        let mut xml = String::from("<worksheet><sheetData>");
        for (row, values) in rows.iter().enumerate() {
            xml.push_str(&format!("<row r=\"{}\">", row + 1));
            for (col, value) in values.iter().enumerate() {
                let reference = crate::spreadsheet::reference::index_to_reference(row, col);
                if value.is_empty() {
                    continue;
                } else if value.parse::<f64>().is_ok() {
                    xml.push_str(&format!("<c r=\"{reference}\"><v>{value}</v></c>"));
                } else {
                    xml.push_str(&format!(
                        "<c r=\"{reference}\" t=\"inlineStr\"><is><t>{}</t></is></c>",
                        escape(value)
                    ));
                }
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData></worksheet>");
        self.sheets.push((name.to_owned(), xml));
        self
    }

    /// Merges a range on the sheet added last.
    pub(crate) fn merge(mut self, range: &str) -> Self {
        self.merges.push(range.to_owned());
        self
    }

    /// Adds a sheet from literal worksheet XML.
    pub(crate) fn raw_sheet(mut self, name: &str, xml: &str) -> Self {
        self.flush_merges();
        self.sheets.push((name.to_owned(), xml.to_owned()));
        self
    }

    /// Adds any other package part, such as `xl/styles.xml`.
    pub(crate) fn part(mut self, path: &str, xml: &str) -> Self {
        self.parts.push((path.to_owned(), xml.to_owned()));
        self
    }

    /// Writes the package to `dir/file_name` and returns its path.
    pub(crate) fn write(mut self, dir: &Path, file_name: &str) -> PathBuf {
        self.flush_merges();
        let path = dir.join(file_name);
        let mut zip = ZipWriter::new(File::create(&path).unwrap());

        let mut workbook = String::from("<workbook xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\"><sheets>");
        let mut relationships = String::from("<Relationships>");
        for (index, (name, xml)) in self.sheets.iter().enumerate() {
            let number = index + 1;
            workbook.push_str(&format!(
                "<sheet name=\"{}\" sheetId=\"{number}\" r:id=\"rId{number}\"/>",
                escape(name)
            ));
            relationships.push_str(&format!(
                "<Relationship Id=\"rId{number}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet{number}.xml\"/>"
            ));
            add_part(&mut zip, &format!("xl/worksheets/sheet{number}.xml"), xml);
        }
        workbook.push_str("</sheets></workbook>");
        relationships.push_str("</Relationships>");

        add_part(&mut zip, "xl/workbook.xml", &workbook);
        add_part(&mut zip, "xl/_rels/workbook.xml.rels", &relationships);
        for (part, xml) in &self.parts {
            add_part(&mut zip, part, xml);
        }
        zip.finish().unwrap();
        path
    }

    fn flush_merges(&mut self) {
        if self.merges.is_empty() {
            return;
        }
        if let Some((_, xml)) = self.sheets.last_mut() {
            let cells: String = self
                .merges
                .iter()
                .map(|range| format!("<mergeCell ref=\"{range}\"/>"))
                .collect();
            let merged = format!("<mergeCells count=\"{}\">{cells}</mergeCells></worksheet>", self.merges.len());
            *xml = xml.replacen("</worksheet>", &merged, 1);
        }
        self.merges.clear();
    }
}

fn add_part(zip: &mut ZipWriter<File>, name: &str, xml: &str) {
    zip.start_file(name, SimpleFileOptions::default()).unwrap();
    zip.write_all(xml.as_bytes()).unwrap();
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}
