//! Census-shaped sheets for tests, written as CSV or as a minimal xlsx.

use anyhow::Result;
use csv::WriterBuilder;
use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

pub fn init_test_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Rows laid out like `co-est2024-pop-XX`: three title rows, a header row,
/// the state total, one row per county, then a blank row and footnotes.
pub fn census_rows(state: &str, counties: &[(&str, [i64; 5])]) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = vec![
        vec!["table with row headers in column A and column headers in rows 3 through 4".into()],
        vec![format!(
            "Annual Estimates of the Resident Population for Counties in {}",
            state
        )],
        vec![
            "Geographic Area".into(),
            "April 1, 2020 Estimates Base".into(),
            "Population Estimate (as of July 1)".into(),
        ],
        ["", "", "2020", "2021", "2022", "2023", "2024"]
            .into_iter()
            .map(String::from)
            .collect(),
    ];

    let mut totals = [0i64; 5];
    for (_, pops) in counties {
        for (t, p) in totals.iter_mut().zip(pops) {
            *t += p;
        }
    }
    let mut total_row = vec![state.to_string(), totals[0].to_string()];
    total_row.extend(totals.iter().map(i64::to_string));
    rows.push(total_row);

    for (name, pops) in counties {
        let mut row = vec![format!(".{}, {}", name, state), pops[0].to_string()];
        row.extend(pops.iter().map(i64::to_string));
        rows.push(row);
    }

    rows.push(vec![String::new()]);
    rows.push(vec!["Note: The estimates are developed from a base that incorporates the 2020 Census.".into()]);
    rows.push(vec!["Release Date: March 2025".into()]);
    rows
}

pub fn write_csv_sheet(path: &Path, rows: &[Vec<String>]) -> Result<PathBuf> {
    let mut wtr = WriterBuilder::new().flexible(true).from_path(path)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(path.to_path_buf())
}

/// Write `rows` as the only sheet of an xlsx workbook. Integer-looking text
/// becomes a numeric cell, everything else an inline string.
pub fn write_xlsx_sheet(path: &Path, sheet: &str, rows: &[Vec<String>]) -> Result<PathBuf> {
    let mut sheet_xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (r, row) in rows.iter().enumerate() {
        sheet_xml.push_str(&format!(r#"<row r="{}">"#, r + 1));
        for (c, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let cell_ref = format!("{}{}", column_letter(c), r + 1);
            if value.parse::<i64>().is_ok() {
                sheet_xml.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, cell_ref, value));
            } else {
                sheet_xml.push_str(&format!(
                    r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    cell_ref,
                    escape_xml(value)
                ));
            }
        }
        sheet_xml.push_str("</row>");
    }
    sheet_xml.push_str("</sheetData></worksheet>");

    let content_types = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;
    let root_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;
    let workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        escape_xml(sheet)
    );
    let workbook_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

    let mut zip = ZipWriter::new(File::create(path)?);
    let options: FileOptions<'_, ()> =
        FileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, body) in [
        ("[Content_Types].xml", content_types.to_string()),
        ("_rels/.rels", root_rels.to_string()),
        ("xl/workbook.xml", workbook),
        ("xl/_rels/workbook.xml.rels", workbook_rels.to_string()),
        ("xl/worksheets/sheet1.xml", sheet_xml),
    ] {
        zip.start_file(name, options)?;
        zip.write_all(body.as_bytes())?;
    }
    zip.finish()?;
    Ok(path.to_path_buf())
}

fn column_letter(idx: usize) -> char {
    (b'A' + idx as u8) as char
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
