//! Writes fetched and converted tables to disk.
//!
//! Every file is first written to a temporary file in the target directory and then
//! renamed into place, so a failed write never leaves a truncated CSV behind.

use crate::persist::error::PersistError;
use crate::types::met_data::MetData;
use log::info;
use polars::prelude::{CsvWriter, DataFrame, SerWriter};
use serde_json::{Map, Value};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Raw table to `file_name`, provider metadata to `<stem>_metadata.json`.
pub(crate) fn write_raw(met_data: &MetData, dir: &Path, file_name: &str) -> Result<(), PersistError> {
    ensure_dir(dir)?;
    let stem = file_stem(file_name)?;
    let csv_path = dir.join(file_name);
    let csv = csv_bytes(&met_data.data, &csv_path)?;
    write_atomic(dir, file_name, &csv)?;

    let metadata_name = metadata_file_name(&stem);
    let json = json_bytes(&met_data.metadata, &dir.join(&metadata_name))?;
    write_atomic(dir, &metadata_name, &json)?;
    Ok(())
}

/// Writes GLM tables, either as loose files or bundled into `<stem>.zip`.
///
/// `tables` pairs each CSV entry name with its table; `metadata` describes the
/// conversion and is stored as `<stem>_metadata.json` in both modes.
pub(crate) fn write_glm(
    dir: &Path,
    file_name: &str,
    compress: bool,
    tables: &[(String, &DataFrame)],
    metadata: &Map<String, Value>,
) -> Result<(), PersistError> {
    ensure_dir(dir)?;
    let stem = file_stem(file_name)?;
    let metadata_name = metadata_file_name(&stem);

    let mut entries = Vec::with_capacity(tables.len() + 1);
    for (name, table) in tables {
        file_stem(name)?;
        entries.push((name.clone(), csv_bytes(table, &dir.join(name))?));
    }
    entries.push((
        metadata_name.clone(),
        json_bytes(metadata, &dir.join(&metadata_name))?,
    ));

    if compress {
        write_zip(dir, &format!("{}.zip", stem), &entries)?;
    } else {
        for (name, bytes) in &entries {
            write_atomic(dir, name, bytes)?;
        }
    }
    Ok(())
}

/// `<stem>_<suffix>.<ext>` for `file_name = <stem>.<ext>`.
pub(crate) fn suffixed_file_name(file_name: &str, suffix: &str) -> Result<String, PersistError> {
    let stem = file_stem(file_name)?;
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("csv");
    Ok(format!("{}_{}.{}", stem, suffix, extension))
}

fn metadata_file_name(stem: &str) -> String {
    format!("{}_metadata.json", stem)
}

fn ensure_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(PersistError::DirectoryMissing(dir.to_path_buf()))
    }
}

/// File names must be a single path component.
fn file_stem(file_name: &str) -> Result<String, PersistError> {
    let path = Path::new(file_name);
    let single_component = path.components().count() == 1 && path.file_name().is_some();
    if file_name.trim().is_empty() || !single_component {
        return Err(PersistError::InvalidFileName(file_name.to_string()));
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| PersistError::InvalidFileName(file_name.to_string()))
}

fn csv_bytes(df: &DataFrame, label: &Path) -> Result<Vec<u8>, PersistError> {
    let mut buffer = Vec::new();
    let mut df = df.clone();
    CsvWriter::new(&mut buffer)
        .include_header(true)
        .finish(&mut df)
        .map_err(|e| PersistError::CsvWrite(label.to_path_buf(), e))?;
    Ok(buffer)
}

fn json_bytes(value: &Map<String, Value>, label: &Path) -> Result<Vec<u8>, PersistError> {
    serde_json::to_vec_pretty(value).map_err(|e| PersistError::JsonWrite(label.to_path_buf(), e))
}

fn write_atomic(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, PersistError> {
    let target = dir.join(file_name);
    let mut temp_file =
        NamedTempFile::new_in(dir).map_err(|e| PersistError::Io(target.clone(), e))?;
    temp_file
        .write_all(bytes)
        .map_err(|e| PersistError::Io(target.clone(), e))?;
    temp_file
        .flush()
        .map_err(|e| PersistError::Io(target.clone(), e))?;
    temp_file
        .persist(&target)
        .map_err(|e| PersistError::Io(target.clone(), e.error))?;
    info!("Wrote {} bytes to {:?}", bytes.len(), target);
    Ok(target)
}

fn write_zip(
    dir: &Path,
    archive_name: &str,
    entries: &[(String, Vec<u8>)],
) -> Result<PathBuf, PersistError> {
    let target = dir.join(archive_name);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in entries {
        archive
            .start_file(name.as_str(), options)
            .map_err(|e| PersistError::Zip(target.clone(), e))?;
        archive
            .write_all(bytes)
            .map_err(|e| PersistError::Io(target.clone(), e))?;
    }
    let buffer = archive
        .finish()
        .map_err(|e| PersistError::Zip(target.clone(), e))?
        .into_inner();
    write_atomic(dir, archive_name, &buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{Column, PolarsError};
    use serde_json::json;
    use std::fs::File;
    use tempfile::tempdir;
    use zip::ZipArchive;

    fn sample() -> Result<DataFrame, PolarsError> {
        DataFrame::new(vec![
            Column::new("time".into(), ["2020-01-01 00:00", "2020-01-01 01:00"]),
            Column::new("AirTemp".into(), [Some(21.5), None]),
        ])
    }

    #[test]
    fn test_file_stem_validation() {
        assert_eq!(file_stem("met.csv").ok(), Some("met".to_string()));
        assert!(file_stem("").is_err());
        assert!(file_stem("../met.csv").is_err());
        assert!(file_stem("out/met.csv").is_err());
    }

    #[test]
    fn test_suffixed_file_name() -> Result<(), PersistError> {
        assert_eq!(suffixed_file_name("met.csv", "EC_Earth3P_HR")?, "met_EC_Earth3P_HR.csv");
        assert_eq!(suffixed_file_name("met", "X")?, "met_X.csv");
        Ok(())
    }

    #[test]
    fn test_write_raw_writes_csv_and_metadata() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let mut metadata = Map::new();
        metadata.insert("elevation".to_string(), json!(47.0));
        let met = MetData::new(metadata, sample()?);

        write_raw(&met, dir.path(), "met_raw.csv")?;

        let csv = std::fs::read_to_string(dir.path().join("met_raw.csv"))?;
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("time,AirTemp"));
        assert_eq!(lines.next(), Some("2020-01-01 00:00,21.5"));
        assert_eq!(lines.next(), Some("2020-01-01 01:00,"));

        let json: Value =
            serde_json::from_slice(&std::fs::read(dir.path().join("met_raw_metadata.json"))?)?;
        assert_eq!(json["elevation"], json!(47.0));
        Ok(())
    }

    #[test]
    fn test_write_glm_zip_contents() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let table = sample()?;
        write_glm(
            dir.path(),
            "met.csv",
            true,
            &[("met.csv".to_string(), &table)],
            &Map::new(),
        )?;

        assert!(!dir.path().join("met.csv").exists());
        let mut archive = ZipArchive::new(File::open(dir.path().join("met.zip"))?)?;
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["met.csv", "met_metadata.json"]);
        let csv = std::io::read_to_string(archive.by_name("met.csv")?)?;
        assert!(csv.starts_with("time,AirTemp\n"));
        Ok(())
    }

    #[test]
    fn test_missing_directory() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let missing = dir.path().join("nope");
        let met = MetData::new(Map::new(), sample()?);
        assert!(matches!(
            write_raw(&met, &missing, "met_raw.csv"),
            Err(PersistError::DirectoryMissing(_))
        ));
        Ok(())
    }
}
