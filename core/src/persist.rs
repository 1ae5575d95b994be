use crate::engine::{JoinConfig, JoinStats};
use crate::error::{EvalError, Side};
use crate::eval::Evaluation;
use crate::record::{Dataset, Record};
use crate::verify::ResultPair;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{create_dir_all, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

pub const SUMMARY_VERSION: u32 = 1;

/// Summary of one join run, written as pretty JSON next to the results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub config: JoinConfig,
    pub stats: JoinStats,
    #[serde(default)]
    pub evaluation: Option<Evaluation>,
    /// Set when a ground truth was given but the scores are undefined.
    #[serde(default)]
    pub evaluation_error: Option<EvalError>,
    pub created_at: String,
    pub version: u32,
}

#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub delimiter: u8,
    /// Cell values read as a missing value. Compared after trimming.
    pub null_markers: Vec<String>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            null_markers: ["", "NA", "N/A", "NaN", "nan", "NULL", "null"].iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CsvOptions {
    fn cell(&self, raw: Option<&str>) -> Option<String> {
        let raw = raw?;
        if self.null_markers.iter().any(|m| m == raw.trim()) { None } else { Some(raw.to_string()) }
    }
}

/// Load a dataset from a CSV or JSONL file, chosen by extension (`.jsonl` is JSONL, anything else CSV).
pub fn load_dataset<P: AsRef<Path>>(path: P, side: Side, id_column: &str, options: &CsvOptions) -> Result<Dataset<String>> {
    let path = path.as_ref();
    if path.extension().and_then(|s| s.to_str()) == Some("jsonl") {
        load_dataset_jsonl(path, side, id_column)
    } else {
        load_dataset_csv(path, side, id_column, options)
    }
}

/// Load a headed CSV. The header gives the schema; `id_column` supplies record ids and stays
/// readable as a field, so it can be part of a join key.
pub fn load_dataset_csv<P: AsRef<Path>>(path: P, side: Side, id_column: &str, options: &CsvOptions) -> Result<Dataset<String>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(options.delimiter)
        .from_path(path)
        .with_context(|| format!("open dataset {:?}", path))?;
    let headers = reader.headers()?.clone();
    let id_idx = headers
        .iter()
        .position(|h| h == id_column)
        .ok_or_else(|| anyhow!("id column '{}' not found in {:?}", id_column, path))?;

    let mut dataset = Dataset::new(side, headers.iter());
    for (line, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("read row {} of {:?}", line + 1, path))?;
        let id = row
            .get(id_idx)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("row {} of {:?} has no id", line + 1, path))?;
        let mut record = Record::new(id);
        for (i, name) in headers.iter().enumerate() {
            record.fields.insert(name.to_string(), options.cell(row.get(i)));
        }
        dataset.push(record)?;
    }
    tracing::info!(path = %path.display(), records = dataset.len(), columns = dataset.columns().len(), "loaded csv dataset");
    Ok(dataset)
}

/// Load one JSON object per line. Scalars are stringified; `null` and absent keys are missing values.
/// The id field is kept in the field map as well.
pub fn load_dataset_jsonl<P: AsRef<Path>>(path: P, side: Side, id_field: &str) -> Result<Dataset<String>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open dataset {:?}", path))?;
    let reader = BufReader::new(f);
    let mut records = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let obj: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&line).with_context(|| format!("parse line {} of {:?}", line_no + 1, path))?;
        let id = obj
            .get(id_field)
            .and_then(value_to_string)
            .ok_or_else(|| anyhow!("line {} of {:?} has no '{}'", line_no + 1, path, id_field))?;
        let fields: BTreeMap<String, Option<String>> = obj
            .iter()
            .map(|(k, v)| (k.clone(), value_to_string(v)))
            .collect();
        records.push(Record { id, fields });
    }
    let dataset = Dataset::from_records(side, records);
    tracing::info!(path = %path.display(), records = dataset.len(), columns = dataset.columns().len(), "loaded jsonl dataset");
    Ok(dataset)
}

fn value_to_string(v: &serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Read `(id1, id2)` pairs from the first two columns of a headed CSV (ground truth or saved results).
pub fn load_pairs_csv<P: AsRef<Path>>(path: P) -> Result<Vec<(String, String)>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open pairs {:?}", path))?;
    let mut pairs = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row?;
        match (row.get(0), row.get(1)) {
            (Some(a), Some(b)) => pairs.push((a.trim().to_string(), b.trim().to_string())),
            _ => return Err(anyhow!("row {} of {:?} has fewer than two columns", line + 1, path)),
        }
    }
    Ok(pairs)
}

#[derive(Serialize)]
struct ResultRow<'a, I> {
    id1: &'a I,
    id2: &'a I,
    jaccard: f64,
    join_key1: String,
    join_key2: String,
}

/// Columns `id1,id2,jaccard,join_key1,join_key2`; keys are space-joined sorted tokens.
pub fn save_results_csv<P: AsRef<Path>, I: Serialize>(path: P, pairs: &[ResultPair<I>]) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Necessary)
        .from_path(path)
        .with_context(|| format!("create results {:?}", path))?;
    // Written by hand so an empty result still has a header.
    writer.write_record(["id1", "id2", "jaccard", "join_key1", "join_key2"])?;
    for p in pairs {
        writer.serialize(ResultRow {
            id1: &p.id1,
            id2: &p.id2,
            jaccard: p.jaccard,
            join_key1: p.join_key1.to_text(),
            join_key2: p.join_key2.to_text(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_results_jsonl<P: AsRef<Path>, I: Serialize>(path: P, pairs: &[ResultPair<I>]) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let f = File::create(path).with_context(|| format!("create results {:?}", path))?;
    let mut w = BufWriter::new(f);
    for p in pairs {
        serde_json::to_writer(&mut w, p)?;
        w.write_all(b"\n")?;
    }
    w.flush()?;
    Ok(())
}

pub fn save_summary<P: AsRef<Path>>(path: P, summary: &RunSummary) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let mut f = File::create(path)?;
    let json = serde_json::to_string_pretty(summary)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_summary<P: AsRef<Path>>(path: P) -> Result<RunSummary> {
    let mut f = File::open(path.as_ref())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let summary: RunSummary = serde_json::from_str(&buf)?;
    Ok(summary)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() { create_dir_all(dir)?; }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn csv_nulls_become_missing() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("a.csv");
        fs::write(&p, "id,title,manufacturer\nb1,Widget Pro,\nb2,Gadget,nan\nb3,Thing,Acme\n").unwrap();
        let ds = load_dataset_csv(&p, Side::Left, "id", &CsvOptions::default()).unwrap();
        assert_eq!(ds.columns(), &["id".to_string(), "title".to_string(), "manufacturer".to_string()]);
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.records()[0].get("manufacturer"), Some(None));
        assert_eq!(ds.records()[1].get("manufacturer"), Some(None));
        assert_eq!(ds.records()[2].get("manufacturer"), Some(Some("Acme")));
        assert_eq!(ds.records()[2].id, "b3");
    }

    #[test]
    fn id_column_stays_a_field() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("a.csv");
        fs::write(&p, "sku,title
AB-12,Widget
").unwrap();
        let ds = load_dataset_csv(&p, Side::Left, "sku", &CsvOptions::default()).unwrap();
        assert!(ds.require_fields(&["sku", "title"]).is_ok());
        assert_eq!(ds.records()[0].get("sku"), Some(Some("AB-12")));
    }

    #[test]
    fn csv_missing_id_column_fails() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("a.csv");
        fs::write(&p, "key,title\n1,x\n").unwrap();
        assert!(load_dataset_csv(&p, Side::Left, "id", &CsvOptions::default()).is_err());
    }

    #[test]
    fn jsonl_stringifies_scalars() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("b.jsonl");
        fs::write(&p, "{\"id\": 7, \"name\": \"widget\", \"price\": 9.5}\n\n{\"id\": \"x\", \"name\": null}\n").unwrap();
        let ds = load_dataset(&p, Side::Right, "id", &CsvOptions::default()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records()[0].id, "7");
        assert_eq!(ds.records()[0].get("id"), Some(Some("7")));
        assert_eq!(ds.records()[0].get("price"), Some(Some("9.5")));
        assert_eq!(ds.records()[1].get("name"), Some(None));
        assert_eq!(ds.records()[1].get("price"), Some(None));
    }

    #[test]
    fn empty_results_still_have_a_header() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("out/none.csv");
        save_results_csv::<_, String>(&p, &[]).unwrap();
        let text = fs::read_to_string(&p).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["id1,id2,jaccard,join_key1,join_key2"]);
        assert!(load_pairs_csv(&p).unwrap().is_empty());
    }

    #[test]
    fn pairs_from_first_two_columns() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("gt.csv");
        fs::write(&p, "idAmazon,idGoogleBase\nb1, g1\nb2,g2\n").unwrap();
        let pairs = load_pairs_csv(&p).unwrap();
        assert_eq!(pairs, vec![("b1".to_string(), "g1".to_string()), ("b2".to_string(), "g2".to_string())]);
    }
}
