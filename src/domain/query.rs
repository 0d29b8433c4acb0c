// src/domain/query.rs
//
// Read side of the catalog: an immutable index loaded once at startup, listing
// filters, pagination and the distributions behind /api/estadisticas.

use crate::domain::catalog::{Catalog, CatalogEntry, CatalogError, Estadisticas};
use crate::domain::listing::{Amenidades, NormalizedListing, RawListing};
use chrono::Utc;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_PER_PAGE: usize = 20;
pub const MAX_PER_PAGE: usize = 500;
pub const MIN_SEARCH_LEN: usize = 2;

#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("parámetro inválido {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
    #[error("amenidad desconocida: {0}")]
    UnknownAmenity(String),
    #[error("el término de búsqueda debe tener al menos 2 caracteres")]
    SearchTooShort,
}

/// A listing as the API and the frontend show it.
#[derive(Debug, Clone, Serialize)]
pub struct ListingCard {
    pub titulo: String,
    pub descripcion: String,
    pub url: Option<String>,
    pub imagen_portada: Option<String>,
    #[serde(flatten)]
    pub datos: NormalizedListing,
}

impl ListingCard {
    fn from_entry(entry: &CatalogEntry) -> Option<Self> {
        let datos = entry.datos_procesados.clone()?;
        let raw = RawListing::from_value(&entry.datos_originales).unwrap_or_default();
        Some(ListingCard {
            titulo: raw.titulo.unwrap_or_default(),
            descripcion: raw.descripcion.unwrap_or_default(),
            url: raw.link,
            imagen_portada: raw.imagen_portada,
            datos,
        })
    }

    fn matches_text(&self, needle: &str) -> bool {
        let haystacks = [
            Some(self.titulo.as_str()),
            Some(self.descripcion.as_str()),
            self.datos.colonia.as_deref(),
            self.datos.ciudad.as_deref(),
        ];
        haystacks
            .into_iter()
            .flatten()
            .any(|h| h.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerPage {
    Count(usize),
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceOrder {
    Desc,
    Asc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    pub pagina: usize,
    pub por_pagina: PerPage,
    pub ciudades: Vec<String>,
    pub tipos: Vec<String>,
    pub operaciones: Vec<String>,
    pub precio_min: Option<f64>,
    pub precio_max: Option<f64>,
    pub amenidades: Vec<String>,
    pub q: Option<String>,
    pub orden_precio: Option<PriceOrder>,
}

impl Default for ListingQuery {
    fn default() -> Self {
        ListingQuery {
            pagina: 1,
            por_pagina: PerPage::Count(DEFAULT_PER_PAGE),
            ciudades: Vec::new(),
            tipos: Vec::new(),
            operaciones: Vec::new(),
            precio_min: None,
            precio_max: None,
            amenidades: Vec::new(),
            q: None,
            orden_precio: None,
        }
    }
}

fn comma_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.to_lowercase())
}

fn parse_field<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, QueryError> {
    value.trim().parse().map_err(|_| QueryError::Invalid {
        name,
        value: value.to_string(),
    })
}

impl ListingQuery {
    /// Builds a query from decoded query-string pairs. Unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = ListingQuery::default();

        for (key, value) in pairs {
            let value = value.as_ref();
            if value.trim().is_empty() {
                continue;
            }
            match key.as_ref() {
                "pagina" => query.pagina = parse_field::<usize>("pagina", value)?.max(1),
                "por_pagina" => {
                    query.por_pagina = if value.trim().eq_ignore_ascii_case("all") {
                        PerPage::All
                    } else {
                        let n = parse_field::<usize>("por_pagina", value)?;
                        PerPage::Count(n.clamp(1, MAX_PER_PAGE))
                    }
                }
                "ciudades" | "ciudad" => query.ciudades.extend(comma_list(value)),
                "tipos" | "tipo_propiedad" => query.tipos.extend(comma_list(value)),
                "operaciones" | "tipo_operacion" => query.operaciones.extend(comma_list(value)),
                "precio_min" => query.precio_min = Some(parse_field("precio_min", value)?),
                "precio_max" => query.precio_max = Some(parse_field("precio_max", value)?),
                "amenidades" => {
                    for name in comma_list(value) {
                        if Amenidades::default().get(&name).is_none() {
                            return Err(QueryError::UnknownAmenity(name));
                        }
                        query.amenidades.push(name);
                    }
                }
                "q" => query.q = Some(value.trim().to_lowercase()),
                "orden_precio" => {
                    query.orden_precio = match value.trim() {
                        "mayor_menor" => Some(PriceOrder::Desc),
                        "menor_mayor" => Some(PriceOrder::Asc),
                        other => {
                            return Err(QueryError::Invalid {
                                name: "orden_precio",
                                value: other.to_string(),
                            })
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(query)
    }

    fn matches(&self, card: &ListingCard) -> bool {
        let d = &card.datos;
        let in_list = |list: &[String], value: Option<String>| {
            list.is_empty()
                || value.is_some_and(|v| list.iter().any(|item| *item == v.to_lowercase()))
        };

        if !in_list(self.ciudades.as_slice(), d.ciudad.clone())
            || !in_list(self.tipos.as_slice(), d.tipo_propiedad.map(|t| t.to_string()))
            || !in_list(self.operaciones.as_slice(), d.tipo_operacion.map(|o| o.to_string()))
        {
            return false;
        }

        if self.precio_min.is_some() || self.precio_max.is_some() {
            let Some(precio) = d.precio else {
                return false;
            };
            if self.precio_min.is_some_and(|min| precio < min)
                || self.precio_max.is_some_and(|max| precio > max)
            {
                return false;
            }
        }

        if !self
            .amenidades
            .iter()
            .all(|name| d.amenidades.get(name).unwrap_or(false))
        {
            return false;
        }

        match &self.q {
            Some(q) => card.matches_text(q),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub propiedades: Vec<T>,
    pub total: usize,
    pub pagina: usize,
    pub por_pagina: usize,
    pub total_paginas: usize,
    pub tiene_siguiente: bool,
    pub tiene_anterior: bool,
}

impl<T: Clone> Page<T> {
    pub fn slice(items: &[T], pagina: usize, por_pagina: PerPage) -> Self {
        let total = items.len();
        let size = match por_pagina {
            PerPage::Count(n) => n.max(1),
            PerPage::All => total.max(1),
        };
        let pagina = pagina.max(1);
        let start = (pagina - 1).saturating_mul(size).min(total);
        let end = start.saturating_add(size).min(total);

        Page {
            propiedades: items[start..end].to_vec(),
            total,
            pagina,
            por_pagina: size,
            total_paginas: total.div_ceil(size),
            tiene_siguiente: end < total,
            tiene_anterior: pagina > 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    #[serde(flatten)]
    pub conteos: Estadisticas,
    pub fecha_procesamiento: String,
    pub por_ciudad: BTreeMap<String, usize>,
    pub por_tipo: BTreeMap<String, usize>,
    pub por_operacion: BTreeMap<String, usize>,
    pub por_rango_precio: BTreeMap<String, usize>,
}

pub fn price_bucket(precio: Option<f64>) -> &'static str {
    match precio {
        None => "sin precio",
        Some(p) if p < 500_000.0 => "0-500k",
        Some(p) if p < 1_000_000.0 => "500k-1M",
        Some(p) if p < 2_000_000.0 => "1M-2M",
        Some(p) if p < 5_000_000.0 => "2M-5M",
        Some(_) => "5M+",
    }
}

/// The catalog loaded into memory, shared read-only between workers.
#[derive(Debug)]
pub struct CatalogIndex {
    catalog: Catalog,
    cards: Vec<ListingCard>,
    by_id: HashMap<String, usize>,
}

impl CatalogIndex {
    pub fn new(catalog: Catalog) -> Self {
        let cards: Vec<ListingCard> = catalog
            .propiedades
            .iter()
            .filter_map(ListingCard::from_entry)
            .collect();
        // First record wins for a repeated id, same as `entry`.
        let mut by_id = HashMap::with_capacity(cards.len());
        for (i, card) in cards.iter().enumerate() {
            by_id.entry(card.datos.id.clone()).or_insert(i);
        }

        CatalogIndex {
            catalog,
            cards,
            by_id,
        }
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        Catalog::load(path).map(Self::new)
    }

    pub fn empty() -> Self {
        Self::new(Catalog::empty(Utc::now()))
    }

    pub fn document(&self) -> &Catalog {
        &self.catalog
    }

    /// Number of listings with processed data.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ListingCard> {
        self.by_id.get(id).map(|&i| &self.cards[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Entry of the persisted document, including ones that failed processing.
    pub fn entry(&self, id: &str) -> Option<&CatalogEntry> {
        self.catalog.propiedades.iter().find(|e| {
            e.datos_procesados.as_ref().map(|d| d.id.as_str()) == Some(id)
                || RawListing::from_value(&e.datos_originales)
                    .ok()
                    .and_then(|raw| raw.source_id().map(|s| s == id))
                    .unwrap_or(false)
        })
    }

    pub fn search(&self, query: &ListingQuery) -> Page<ListingCard> {
        let mut hits: Vec<&ListingCard> = self.cards.iter().filter(|c| query.matches(c)).collect();

        if let Some(order) = query.orden_precio {
            // Listings without a price go last either way.
            hits.sort_by(|a, b| match (a.datos.precio, b.datos.precio) {
                (Some(x), Some(y)) => {
                    let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
                    match order {
                        PriceOrder::Asc => ord,
                        PriceOrder::Desc => ord.reverse(),
                    }
                }
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            });
        }

        let hits: Vec<ListingCard> = hits.into_iter().cloned().collect();
        Page::slice(&hits, query.pagina, query.por_pagina)
    }

    /// Free-text search used by /api/buscar.
    pub fn text_search(&self, q: &str, limit: usize) -> Result<Vec<ListingCard>, QueryError> {
        let needle = q.trim().to_lowercase();
        if needle.chars().count() < MIN_SEARCH_LEN {
            return Err(QueryError::SearchTooShort);
        }
        Ok(self
            .cards
            .iter()
            .filter(|c| c.matches_text(&needle))
            .take(limit)
            .cloned()
            .collect())
    }

    pub fn stats(&self) -> CatalogStats {
        let mut por_ciudad = BTreeMap::new();
        let mut por_tipo = BTreeMap::new();
        let mut por_operacion = BTreeMap::new();
        let mut por_rango_precio = BTreeMap::new();

        for card in &self.cards {
            let d = &card.datos;
            *por_ciudad
                .entry(d.ciudad.clone().unwrap_or_else(|| "Sin ciudad".to_string()))
                .or_insert(0) += 1;
            *por_tipo
                .entry(
                    d.tipo_propiedad
                        .map(|t| t.to_string())
                        .unwrap_or_else(|| "Sin tipo".to_string()),
                )
                .or_insert(0) += 1;
            *por_operacion
                .entry(
                    d.tipo_operacion
                        .map(|o| o.to_string())
                        .unwrap_or_else(|| "Sin operación".to_string()),
                )
                .or_insert(0) += 1;
            *por_rango_precio
                .entry(price_bucket(d.precio).to_string())
                .or_insert(0) += 1;
        }

        CatalogStats {
            conteos: self.catalog.estadisticas,
            fecha_procesamiento: self.catalog.fecha_procesamiento.to_rfc3339(),
            por_ciudad,
            por_tipo,
            por_operacion,
            por_rango_precio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::raw_records;
    use serde_json::json;

    fn index() -> CatalogIndex {
        let doc = json!([
            {"id": "1", "titulo": "Casa con alberca", "precio": "$3,000,000", "tipo_operacion": "Venta",
             "ciudad": "Cuernavaca", "descripcion": "alberca y jardín"},
            {"id": "2", "titulo": "Departamento céntrico", "precio": "$12,000", "tipo_operacion": "Renta",
             "ciudad": "Cuernavaca", "colonia": "Centro"},
            {"id": "3", "titulo": "Terreno plano", "precio": "$450,000", "tipo_operacion": "Venta",
             "ciudad": "Jiutepec"},
            {"id": "4", "titulo": "Casa por consultar", "precio": "A tratar", "ciudad": "Temixco"},
            {"titulo": "sin id"}
        ]);
        CatalogIndex::new(Catalog::build(raw_records(doc).unwrap(), Utc::now()))
    }

    fn query(pairs: &[(&str, &str)]) -> ListingQuery {
        ListingQuery::from_pairs(pairs.iter().copied()).unwrap()
    }

    fn ids(page: &Page<ListingCard>) -> Vec<&str> {
        page.propiedades.iter().map(|c| c.datos.id.as_str()).collect()
    }

    #[test]
    fn index_skips_failed_entries() {
        let idx = index();
        assert_eq!(idx.len(), 4);
        assert!(idx.contains("4"));
        assert!(idx.get("1").is_some());
        assert!(idx.get("nope").is_none());
        assert_eq!(idx.document().propiedades.len(), 5);
    }

    #[test]
    fn repeated_id_resolves_to_the_first_record() {
        let doc = json!([
            {"id": "7", "titulo": "Primera casa", "precio": "$1,000,000", "tipo_operacion": "Venta"},
            {"id": "7", "titulo": "Segunda casa", "precio": "$2,000,000", "tipo_operacion": "Venta"}
        ]);
        let idx = CatalogIndex::new(Catalog::build(raw_records(doc).unwrap(), Utc::now()));

        let card = idx.get("7").unwrap();
        assert_eq!(card.titulo, "Primera casa");
        let entry = idx.entry("7").unwrap();
        assert_eq!(entry.datos_originales["titulo"], json!("Primera casa"));
    }

    #[test]
    fn filters_combine() {
        let idx = index();
        let page = idx.search(&query(&[("ciudades", "cuernavaca"), ("operaciones", "Venta")]));
        assert_eq!(ids(&page), vec!["1"]);

        let page = idx.search(&query(&[("amenidades", "alberca,jardin")]));
        assert_eq!(ids(&page), vec!["1"]);

        let page = idx.search(&query(&[("precio_min", "100000"), ("precio_max", "1000000")]));
        assert_eq!(ids(&page), vec!["3"]);

        let page = idx.search(&query(&[("q", "CENTRO")]));
        assert_eq!(ids(&page), vec!["2"]);
    }

    #[test]
    fn price_order_puts_unpriced_last() {
        let idx = index();
        let desc = idx.search(&query(&[("orden_precio", "mayor_menor")]));
        assert_eq!(ids(&desc), vec!["1", "3", "2", "4"]);
        let asc = idx.search(&query(&[("orden_precio", "menor_mayor")]));
        assert_eq!(ids(&asc), vec!["2", "3", "1", "4"]);
    }

    #[test]
    fn pagination_arithmetic() {
        let items: Vec<u32> = (1..=45).collect();
        let page = Page::slice(&items, 3, PerPage::Count(20));
        assert_eq!(page.propiedades, (41..=45).collect::<Vec<_>>());
        assert_eq!(page.total_paginas, 3);
        assert!(!page.tiene_siguiente);
        assert!(page.tiene_anterior);

        let all = Page::slice(&items, 1, PerPage::All);
        assert_eq!(all.propiedades.len(), 45);
        assert_eq!(all.total_paginas, 1);

        let past_end = Page::slice(&items, 9, PerPage::Count(20));
        assert!(past_end.propiedades.is_empty());

        let empty: Page<u32> = Page::slice(&[], 1, PerPage::All);
        assert_eq!(empty.total_paginas, 0);
    }

    #[test]
    fn query_parsing_rules() {
        let q = query(&[("por_pagina", "9999"), ("pagina", "0"), ("tipo_propiedad", "Casa")]);
        assert_eq!(q.por_pagina, PerPage::Count(MAX_PER_PAGE));
        assert_eq!(q.pagina, 1);
        assert_eq!(q.tipos, vec!["casa".to_string()]);

        assert_eq!(query(&[("por_pagina", "all")]).por_pagina, PerPage::All);
        assert!(ListingQuery::from_pairs([("amenidades", "helipuerto")]).is_err());
        assert!(ListingQuery::from_pairs([("orden_precio", "random")]).is_err());
        assert!(ListingQuery::from_pairs([("precio_min", "mucho")]).is_err());
    }

    #[test]
    fn text_search_requires_two_chars() {
        let idx = index();
        assert_eq!(idx.text_search("a", 50).unwrap_err(), QueryError::SearchTooShort);
        let hits = idx.text_search("casa", 50).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn stats_distributions() {
        let stats = index().stats();
        assert_eq!(stats.conteos.total_propiedades, 5);
        assert_eq!(stats.por_ciudad["Cuernavaca"], 2);
        assert_eq!(stats.por_tipo["Casa"], 2);
        assert_eq!(stats.por_operacion["Sin operación"], 1);
        assert_eq!(stats.por_rango_precio["2M-5M"], 1);
        assert_eq!(stats.por_rango_precio["sin precio"], 1);
        assert_eq!(stats.por_rango_precio["0-500k"], 2);
    }

    #[test]
    fn price_buckets_edges() {
        assert_eq!(price_bucket(Some(499_999.0)), "0-500k");
        assert_eq!(price_bucket(Some(500_000.0)), "500k-1M");
        assert_eq!(price_bucket(Some(5_000_000.0)), "5M+");
        assert_eq!(price_bucket(None), "sin precio");
    }
}
