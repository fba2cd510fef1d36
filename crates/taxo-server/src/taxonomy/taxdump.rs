//! NCBI Taxonomy taxdump loader
//!
//! Reads the `.dmp` files of an NCBI taxdump directory into a [`TaxonomyIndex`]:
//! - `nodes.dmp`: `tax_id | parent tax_id | rank | ...`
//! - `names.dmp`: `tax_id | name_txt | unique name | name class |` (only
//!   "scientific name" rows are kept)
//! - `merged.dmp`: `old_tax_id | new_tax_id |` (optional)
//!
//! # File Format
//! Fields are separated by `\t|\t` and lines end with `\t|`.
//! Lines that cannot be parsed are skipped with a warning.

use std::path::Path;
use taxo_common::{Result, TaxId, TaxoError};
use tracing::{debug, info, warn};

use super::memory::TaxonomyIndex;

pub const NODES_FILE: &str = "nodes.dmp";
pub const NAMES_FILE: &str = "names.dmp";
pub const MERGED_FILE: &str = "merged.dmp";

const SCIENTIFIC_NAME_CLASS: &str = "scientific name";

/// Load a taxdump directory into an index
pub fn load_index(dir: &Path) -> Result<TaxonomyIndex> {
    let nodes = read_dump(dir, NODES_FILE)?;
    let names = read_dump(dir, NAMES_FILE)?;
    let merged_path = dir.join(MERGED_FILE);
    let merged = if merged_path.exists() {
        Some(read_dump(dir, MERGED_FILE)?)
    } else {
        debug!(path = %merged_path.display(), "No merged.dmp, merged IDs will not be translated");
        None
    };

    let parser = TaxdumpParser::new();
    let mut index = TaxonomyIndex::new();

    for (id, parent) in parser.parse_nodes(&nodes) {
        index.insert_parent(id, parent);
    }
    for (id, name) in parser.parse_names(&names) {
        index.insert_name(id, name);
    }
    if let Some(merged) = merged {
        for (old, new) in parser.parse_merged(&merged) {
            index.insert_merged(old, new);
        }
    }

    if index.is_empty() {
        return Err(TaxoError::Config(format!(
            "taxdump directory {} contains no taxa",
            dir.display()
        )));
    }

    info!(taxa = index.len(), dir = %dir.display(), "Loaded taxdump");
    Ok(index)
}

fn read_dump(dir: &Path, file: &str) -> Result<String> {
    let path = dir.join(file);
    std::fs::read_to_string(&path).map_err(|e| {
        TaxoError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })
}

/// Parser for NCBI taxdump `.dmp` files
#[derive(Debug, Default)]
pub struct TaxdumpParser;

impl TaxdumpParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse `nodes.dmp` into (taxon, parent) pairs
    pub fn parse_nodes(&self, content: &str) -> Vec<(TaxId, TaxId)> {
        self.parse_lines(NODES_FILE, content, |fields, line| {
            let id = parse_id(NODES_FILE, line, fields.first())?;
            let parent = parse_id(NODES_FILE, line, fields.get(1))?;
            Ok(Some((id, parent)))
        })
    }

    /// Parse `names.dmp` into (taxon, scientific name) pairs
    pub fn parse_names(&self, content: &str) -> Vec<(TaxId, String)> {
        self.parse_lines(NAMES_FILE, content, |fields, line| {
            if fields.len() < 4 {
                return Err(TaxoError::parse(
                    NAMES_FILE,
                    line,
                    format!("expected 4 fields, got {}", fields.len()),
                ));
            }
            if fields[3] != SCIENTIFIC_NAME_CLASS {
                return Ok(None);
            }
            let id = parse_id(NAMES_FILE, line, fields.first())?;
            Ok(Some((id, fields[1].to_string())))
        })
    }

    /// Parse `merged.dmp` into (old, new) pairs
    pub fn parse_merged(&self, content: &str) -> Vec<(TaxId, TaxId)> {
        self.parse_lines(MERGED_FILE, content, |fields, line| {
            let old = parse_id(MERGED_FILE, line, fields.first())?;
            let new = parse_id(MERGED_FILE, line, fields.get(1))?;
            Ok(Some((old, new)))
        })
    }

    fn parse_lines<T, F>(&self, file: &str, content: &str, mut parse: F) -> Vec<T>
    where
        F: FnMut(&[&str], usize) -> Result<Option<T>>,
    {
        let mut records = Vec::new();
        let mut skipped = 0usize;

        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let fields = split_fields(line);
            match parse(&fields, index + 1) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {},
                Err(e) => {
                    skipped += 1;
                    warn!(error = %e, "Skipping malformed taxdump line");
                },
            }
        }

        debug!(file, records = records.len(), skipped, "Parsed taxdump file");
        records
    }
}

fn split_fields(line: &str) -> Vec<&str> {
    line.trim_end_matches(['\n', '\r'])
        .trim_end_matches("\t|")
        .split("\t|\t")
        .map(str::trim)
        .collect()
}

fn parse_id(file: &str, line: usize, field: Option<&&str>) -> Result<TaxId> {
    let raw = field.ok_or_else(|| TaxoError::parse(file, line, "missing taxid field"))?;
    raw.parse()
        .map_err(|e| TaxoError::parse(file, line, format!("invalid taxid '{}': {}", raw, e)))
}
