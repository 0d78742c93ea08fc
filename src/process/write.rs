use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, Int32Array, Int64Array, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use std::{fs, fs::File, path::Path, sync::Arc};

use crate::process::record::PopulationRecord;

/// Write `records` to `path`: Parquet for a `.parquet` extension, CSV with a
/// `State,County,Year,Population` header otherwise.
pub fn write_records(path: &Path, records: &[PopulationRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }

    let is_parquet = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("parquet"))
        .unwrap_or(false);
    if is_parquet {
        write_parquet(path, records)
    } else {
        write_csv(path, records)
    }
}

pub fn write_csv(path: &Path, records: &[PopulationRecord]) -> Result<()> {
    let mut wtr =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    if records.is_empty() {
        wtr.write_record(["State", "County", "Year", "Population"])?;
    }
    for record in records {
        wtr.serialize(record)
            .with_context(|| format!("writing row to {}", path.display()))?;
    }
    wtr.flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

pub fn records_schema() -> Schema {
    Schema::new(vec![
        Field::new("State", DataType::Utf8, false),
        Field::new("County", DataType::Utf8, false),
        Field::new("Year", DataType::Int32, false),
        Field::new("Population", DataType::Int64, false),
    ])
}

pub fn write_parquet(path: &Path, records: &[PopulationRecord]) -> Result<()> {
    let schema = Arc::new(records_schema());
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(records.iter().map(|r| r.state.as_str()))),
        Arc::new(StringArray::from_iter_values(records.iter().map(|r| r.county.as_str()))),
        Arc::new(Int32Array::from_iter_values(records.iter().map(|r| r.year))),
        Arc::new(Int64Array::from_iter_values(records.iter().map(|r| r.population))),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns)
        .context("building population record batch")?;

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer =
        ArrowWriter::try_new(file, schema, Some(props)).context("creating parquet writer")?;
    writer.write(&batch).context("writing population batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::tempdir;

    fn sample() -> Vec<PopulationRecord> {
        vec![
            PopulationRecord {
                state: "Virginia".into(),
                county: "Fairfax County, Virginia-ish".into(),
                year: 2019,
                population: -4,
            },
            PopulationRecord {
                state: "Virginia".into(),
                county: "Arlington County".into(),
                year: 2020,
                population: 238_643,
            },
        ]
    }

    #[test]
    fn csv_has_fixed_header_and_quotes_commas() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested/out.csv");
        write_records(&path, &sample())?;

        let text = fs::read_to_string(&path)?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "State,County,Year,Population");
        assert_eq!(lines[1], r#"Virginia,"Fairfax County, Virginia-ish",2019,-4"#);
        assert_eq!(lines[2], "Virginia,Arlington County,2020,238643");
        Ok(())
    }

    #[test]
    fn parquet_output_keeps_rows() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.parquet");
        write_records(&path, &sample())?;

        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&path)?)?.build()?;
        let mut rows = 0;
        for batch in reader {
            let batch = batch?;
            assert_eq!(batch.schema().field(2).name(), "Year");
            rows += batch.num_rows();
        }
        assert_eq!(rows, 2);
        Ok(())
    }
}
