// src/domain/catalog.rs
use crate::domain::extract::{extract, ExtractError};
use crate::domain::listing::{NormalizedListing, RawListing};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0} must hold a JSON array or an object keyed by id")]
    UnexpectedShape(PathBuf),
}

impl CatalogError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        CatalogError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        CatalogError::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One record of the raw repository, before any typing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Key in the repository object, used as id when the record carries none.
    pub key: Option<String>,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub datos_originales: Value,
    pub datos_procesados: Option<NormalizedListing>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errores: Vec<String>,
}

impl CatalogEntry {
    pub fn is_ok(&self) -> bool {
        self.datos_procesados.is_some() && self.errores.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estadisticas {
    pub total_propiedades: usize,
    pub procesadas_exitosamente: usize,
    pub con_errores: usize,
}

impl Estadisticas {
    pub fn from_entries(entries: &[CatalogEntry]) -> Self {
        let ok = entries.iter().filter(|e| e.is_ok()).count();
        Estadisticas {
            total_propiedades: entries.len(),
            procesadas_exitosamente: ok,
            con_errores: entries.len() - ok,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub fecha_procesamiento: DateTime<Utc>,
    pub propiedades: Vec<CatalogEntry>,
    pub estadisticas: Estadisticas,
}

impl Catalog {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Catalog {
            fecha_procesamiento: now,
            propiedades: Vec::new(),
            estadisticas: Estadisticas::default(),
        }
    }

    /// Runs every record through the extractor. A failing record is kept with
    /// `datos_procesados: null` and never stops the pass.
    pub fn build(records: Vec<RawRecord>, now: DateTime<Utc>) -> Self {
        let propiedades: Vec<CatalogEntry> = records.into_iter().map(process_record).collect();
        let estadisticas = Estadisticas::from_entries(&propiedades);

        Catalog {
            fecha_procesamiento: now,
            propiedades,
            estadisticas,
        }
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let file = File::open(path).map_err(|e| CatalogError::io(path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| CatalogError::json(path, e))
    }

    /// Keeps the previous document as `<path>.bak`, writes to a temporary sibling and
    /// renames it into place.
    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| CatalogError::io(dir, e))?;
        }

        if path.exists() {
            let backup = sibling(path, ".bak");
            fs::copy(path, &backup).map_err(|e| CatalogError::io(&backup, e))?;
        }

        let tmp = sibling(path, ".tmp");
        {
            let file = File::create(&tmp).map_err(|e| CatalogError::io(&tmp, e))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, self)
                .map_err(|e| CatalogError::json(&tmp, e))?;
            writer.flush().map_err(|e| CatalogError::io(&tmp, e))?;
        }
        fs::rename(&tmp, path).map_err(|e| CatalogError::io(path, e))?;

        Ok(())
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn process_record(record: RawRecord) -> CatalogEntry {
    let outcome = typed_listing(&record).and_then(|raw| extract(&raw));

    match outcome {
        Ok(extraction) => {
            let errores: Vec<String> = extraction.issues.iter().map(ToString::to_string).collect();
            if !errores.is_empty() {
                warn!(id = %extraction.listing.id, issues = ?errores, "listing extracted with errors");
            }
            CatalogEntry {
                datos_originales: record.value,
                datos_procesados: Some(extraction.listing),
                errores,
            }
        }
        Err(e) => {
            warn!(key = ?record.key, error = %e, "listing could not be processed");
            CatalogEntry {
                datos_originales: record.value,
                datos_procesados: None,
                errores: vec![e.to_string()],
            }
        }
    }
}

fn typed_listing(record: &RawRecord) -> Result<RawListing, ExtractError> {
    if !record.value.is_object() {
        return Err(ExtractError::NotAnObject);
    }
    let mut raw = RawListing::from_value(&record.value)?;
    if raw.source_id().is_none() {
        raw.id = record.key.clone();
    }
    Ok(raw)
}

/// Splits a repository document into records. Arrays keep their order; objects are
/// keyed by source id, where the literal key `"None"` names no id.
pub fn raw_records(doc: Value) -> Option<Vec<RawRecord>> {
    match doc {
        Value::Array(items) => Some(
            items
                .into_iter()
                .map(|value| RawRecord { key: None, value })
                .collect(),
        ),
        Value::Object(map) => Some(
            map.into_iter()
                .map(|(key, value)| RawRecord {
                    key: (key != "None" && !key.trim().is_empty()).then_some(key),
                    value,
                })
                .collect(),
        ),
        _ => None,
    }
}

pub fn read_repository(path: &Path) -> Result<Vec<RawRecord>, CatalogError> {
    let file = File::open(path).map_err(|e| CatalogError::io(path, e))?;
    let doc: Value =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| CatalogError::json(path, e))?;
    raw_records(doc).ok_or_else(|| CatalogError::UnexpectedShape(path.to_path_buf()))
}

/// `process` subcommand: raw repository in, catalog document out.
pub fn process_repository(input: &Path, output: &Path) -> Result<Estadisticas, CatalogError> {
    let records = read_repository(input)?;
    info!(input = %input.display(), records = records.len(), "processing raw listings");

    let catalog = Catalog::build(records, Utc::now());
    catalog.save(output)?;

    let stats = catalog.estadisticas;
    info!(
        output = %output.display(),
        total = stats.total_propiedades,
        ok = stats.procesadas_exitosamente,
        errors = stats.con_errores,
        "catalog written"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::listing::TipoOperacion;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    #[test]
    fn counters_add_up_with_mixed_records() {
        let doc = json!([
            {"id": "1", "titulo": "Casa", "precio": "$1,000,000", "tipo_operacion": "Venta"},
            {"id": "2", "titulo": "Depto", "precio": "consultar"},
            {"titulo": "sin id", "precio": "$5"},
            "no soy un objeto",
            {"id": "5", "titulo": 42}
        ]);

        let catalog = Catalog::build(raw_records(doc).unwrap(), now());
        let stats = catalog.estadisticas;

        assert_eq!(stats.total_propiedades, catalog.propiedades.len());
        assert_eq!(stats.total_propiedades, 5);
        assert_eq!(stats.procesadas_exitosamente, 1);
        assert_eq!(
            stats.procesadas_exitosamente + stats.con_errores,
            stats.total_propiedades
        );

        // price problems keep the processed data, structural ones do not
        assert!(catalog.propiedades[1].datos_procesados.is_some());
        assert_eq!(catalog.propiedades[1].errores.len(), 1);
        assert!(catalog.propiedades[2].datos_procesados.is_none());
        assert!(catalog.propiedades[3].datos_procesados.is_none());
        assert!(catalog.propiedades[4].datos_procesados.is_none());
        assert_eq!(catalog.propiedades[3].datos_originales, json!("no soy un objeto"));
    }

    #[test]
    fn keyed_repository_supplies_ids() {
        let doc = json!({
            "777": {"titulo": "Terreno", "precio": "$300,000"},
            "None": {"titulo": "Casa", "precio": "$1"}
        });

        let catalog = Catalog::build(raw_records(doc).unwrap(), now());
        let by_title = |t: &str| {
            catalog
                .propiedades
                .iter()
                .find(|e| e.datos_originales["titulo"] == json!(t))
                .unwrap()
        };

        assert_eq!(
            by_title("Terreno").datos_procesados.as_ref().unwrap().id,
            "777"
        );
        assert!(by_title("Casa").datos_procesados.is_none());
        // original record is stored untouched
        assert!(by_title("Terreno").datos_originales.get("id").is_none());
    }

    #[test]
    fn nested_scraper_records_are_processed() {
        let doc = json!({
            "4242": {
                "id": "4242",
                "link": "https://www.facebook.com/marketplace/item/4242/",
                "titulo": "Casa en venta en Temixco",
                "precio": {"texto": "$1,850,000", "valor": 1850000.0, "es_valido": true},
                "ciudad": "temixco",
                "descripcion": "Casa de 3 recámaras con alberca",
                "imagen_portada": {"nombre_archivo": "temixco-4242.jpg", "ruta_relativa": "img"},
                "tipo_operacion": {"tipo": "Venta", "tipo_detectado": "Venta", "confianza": "alta"},
                "ubicacion": {"ciudad": "Temixco", "estado": "Morelos", "texto_original": "Temixco, Mor."},
                "archivos": {"html": "temixco-4242.html"}
            }
        });

        let catalog = Catalog::build(raw_records(doc).unwrap(), now());
        assert_eq!(catalog.estadisticas.procesadas_exitosamente, 1);
        assert_eq!(catalog.estadisticas.con_errores, 0);

        let entry = &catalog.propiedades[0];
        assert!(entry.errores.is_empty(), "{:?}", entry.errores);
        let listing = entry.datos_procesados.as_ref().unwrap();
        assert_eq!(listing.precio, Some(1_850_000.0));
        assert_eq!(listing.tipo_operacion, Some(TipoOperacion::Venta));
        assert_eq!(listing.ciudad.as_deref(), Some("temixco"));
        assert_eq!(listing.estado.as_deref(), Some("Morelos"));
        assert!(listing.amenidades.alberca);
        // stored as scraped
        assert!(entry.datos_originales["precio"].is_object());
    }

    #[test]
    fn scalar_document_is_rejected() {
        assert!(raw_records(json!(12)).is_none());
    }

    #[test]
    fn save_keeps_backup_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("salida").join("catalogo.json");

        let first = Catalog::build(
            raw_records(json!([{"id": "1", "precio": "$10"}])).unwrap(),
            now(),
        );
        first.save(&path).unwrap();
        assert!(!sibling(&path, ".bak").exists());

        let second = Catalog::empty(now());
        second.save(&path).unwrap();

        let backup = Catalog::load(&sibling(&path, ".bak")).unwrap();
        assert_eq!(backup, first);
        assert_eq!(Catalog::load(&path).unwrap(), second);
        assert!(!sibling(&path, ".tmp").exists());
    }

    #[test]
    fn process_repository_writes_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("repo.json");
        let output = dir.path().join("catalogo.json");
        fs::write(
            &input,
            json!({"10": {"titulo": "Casa", "precio": "$2,000,000", "descripcion": "alberca"}})
                .to_string(),
        )
        .unwrap();

        let stats = process_repository(&input, &output).unwrap();
        assert_eq!(stats.total_propiedades, 1);
        assert_eq!(stats.con_errores, 0);

        let doc: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(doc["propiedades"][0]["datos_procesados"]["alberca"], json!(true));
        assert!(doc["propiedades"][0].get("errores").is_none());
        assert!(doc["fecha_procesamiento"].is_string());
    }

    #[test]
    fn unreadable_input_fails_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("repo.json");
        fs::write(&input, "{ no es json").unwrap();
        let err = process_repository(&input, &dir.path().join("out.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Json { .. }));
    }
}
