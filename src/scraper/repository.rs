use crate::domain::listing::RawListing;
use crate::scraper::ScraperError;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Raw repository document: a JSON object of scraped listings keyed by source id.
pub struct Repository {
    path: PathBuf,
    entries: Map<String, Value>,
    /// Records from an array document that carry no usable id. They are never
    /// dropped; a repository holding any is saved back as an array.
    unkeyed: Vec<Value>,
}

impl Repository {
    /// Opens the document at `path`; a missing file starts an empty repository.
    /// An array document is re-keyed by each record's id. Any other top-level
    /// value is rejected so a later save cannot overwrite it.
    pub fn open(path: &Path) -> Result<Self, ScraperError> {
        let mut entries = Map::new();
        let mut unkeyed = Vec::new();

        if path.exists() {
            let doc: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
            match doc {
                Value::Object(map) => entries = map,
                Value::Array(items) => {
                    for (position, item) in items.into_iter().enumerate() {
                        let Some(id) = record_id(&item) else {
                            warn!(position, path = %path.display(), "repository record without id kept unkeyed");
                            unkeyed.push(item);
                            continue;
                        };
                        if entries.insert(id.clone(), item).is_some() {
                            warn!(%id, position, "duplicate id in repository, later record kept");
                        }
                    }
                }
                other => {
                    return Err(ScraperError::Repository(format!(
                        "{} must hold a JSON object or array, found {}",
                        path.display(),
                        json_kind(&other)
                    )))
                }
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            entries,
            unkeyed,
        })
    }

    /// Number of keyed listings. Unkeyed records are not counted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn unkeyed_len(&self) -> usize {
        self.unkeyed.len()
    }

    /// Inserts or replaces the listing under its id. Returns true for a new id.
    pub fn upsert(&mut self, listing: &RawListing) -> Result<bool, ScraperError> {
        let id = listing
            .source_id()
            .ok_or_else(|| ScraperError::MissingContent("listing without id".into()))?
            .to_string();
        let value = serde_json::to_value(listing)?;
        Ok(self.entries.insert(id, value).is_none())
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.entries.get(id)
    }

    pub fn save(&self) -> Result<(), ScraperError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let body = if self.unkeyed.is_empty() {
            serde_json::to_string_pretty(&self.entries)?
        } else {
            serde_json::to_string_pretty(&self.as_array())?
        };
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Keyed records first, each carrying its id, then the unkeyed ones in file order.
    fn as_array(&self) -> Vec<Value> {
        let keyed = self.entries.iter().map(|(id, record)| {
            let mut record = record.clone();
            let has_id = record_id(&record).is_some();
            if let (false, Value::Object(map)) = (has_id, &mut record) {
                map.insert("id".into(), Value::String(id.clone()));
            }
            record
        });
        keyed.chain(self.unkeyed.iter().cloned()).collect()
    }
}

fn record_id(item: &Value) -> Option<String> {
    match item.get("id")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
