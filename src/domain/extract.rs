// src/domain/extract.rs
//
// Field Extractor: RawListing -> NormalizedListing through fixed regex rules.
// Every rule list is ordered; within a field the first matching rule wins.

use crate::domain::listing::{
    Amenidades, Legal, Moneda, NormalizedListing, RawListing, TipoOperacion, TipoPropiedad,
};
use regex::{Captures, Regex};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Failures that make a record unusable as a whole.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("registro sin id de origen")]
    MissingId,
    #[error("el registro no es un objeto JSON")]
    NotAnObject,
    #[error("registro mal formado: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Field-level problems. The listing is still produced; the builder counts these as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldIssue {
    PriceMissing,
    PriceUnparsable(String),
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldIssue::PriceMissing => write!(f, "precio ausente"),
            FieldIssue::PriceUnparsable(raw) => write!(f, "precio no interpretable: {raw:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub listing: NormalizedListing,
    pub issues: Vec<FieldIssue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Price {
    pub value: Result<f64, FieldIssue>,
    pub moneda: Option<Moneda>,
}

pub fn extract(raw: &RawListing) -> Result<Extraction, ExtractError> {
    let id = raw.source_id().ok_or(ExtractError::MissingId)?.to_string();
    let rules = rules();
    let title = raw.title();
    let text = raw.description();

    let price = parse_price(raw.precio.as_deref());
    let mut issues = Vec::new();
    let precio = match price.value {
        Ok(v) => Some(v),
        Err(issue) => {
            issues.push(issue);
            None
        }
    };

    let niveles = first_count(&rules.niveles, text);

    let listing = NormalizedListing {
        id,
        precio,
        moneda: price.moneda,
        tipo_operacion: TipoOperacion::from_source(raw.tipo_operacion.as_deref()),
        tipo_propiedad: rules
            .property_types
            .iter()
            .find(|(_, re)| re.is_match(title))
            .map(|(tipo, _)| *tipo),
        colonia: raw.colonia.clone(),
        ciudad: raw.ciudad.clone(),
        estado: raw.estado.clone(),
        recamaras: first_count(&rules.recamaras, text),
        banos: first_count(&rules.banos, text),
        medio_bano: first_count(&rules.medio_bano, text),
        niveles,
        estacionamientos: first_count(&rules.estacionamientos, text),
        superficie_m2: first_area(&rules.superficie, text),
        construccion_m2: first_area(&rules.construccion, text),
        amenidades: Amenidades {
            alberca: rules.flags.alberca.is_match(text),
            patio: rules.flags.patio.is_match(text),
            bodega: rules.flags.bodega.is_match(text),
            terraza: rules.flags.terraza.is_match(text),
            cisterna: rules.flags.cisterna.is_match(text),
            jardin: rules.flags.jardin.is_match(text),
            roof_garden: rules.flags.roof_garden.is_match(text),
            seguridad: rules.flags.seguridad.is_match(text),
        },
        es_un_nivel: niveles.map(|n| n == 1),
        legal: Legal {
            escrituras: rules.flags.escrituras.is_match(text),
            cesion_derechos: rules.flags.cesion_derechos.is_match(text),
            credito: rules.flags.credito.is_match(text),
            contado: rules.flags.contado.is_match(text),
        },
    };

    Ok(Extraction { listing, issues })
}

/// Parses price text such as `"$1,200,000"`, `"1.5 millones"` or `"$850 mil"`.
pub fn parse_price(text: Option<&str>) -> Price {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Price {
            value: Err(FieldIssue::PriceMissing),
            moneda: None,
        };
    };

    let moneda = (text.contains('$') || text.to_uppercase().contains("MXN")).then_some(Moneda::Mxn);
    let unparsable = || FieldIssue::PriceUnparsable(text.to_string());

    let value = rules()
        .price
        .captures(text)
        .and_then(|caps| {
            let number = parse_number(caps.get(1)?.as_str())?;
            let multiplier = match caps.get(2).map(|m| m.as_str().to_lowercase()) {
                None => 1.0,
                Some(unit) if unit == "mil" || unit == "k" => 1_000.0,
                Some(_) => 1_000_000.0,
            };
            if multiplier == 1.0 {
                Some(number)
            } else {
                Some((number * multiplier * 100.0).round() / 100.0)
            }
        })
        .filter(|v| v.is_finite() && *v > 0.0)
        .ok_or_else(unparsable);

    Price { value, moneda }
}

/// Normalises Mexican/European digit grouping into a float.
///
/// With both `.` and `,` present the one appearing last is the decimal mark.
/// A lone separator followed by exactly three digits groups thousands; otherwise it
/// is the decimal mark. Repeated separators always group thousands.
pub fn parse_number(raw: &str) -> Option<f64> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let s = compact.trim_matches(|c| c == '.' || c == ',');
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
        return None;
    }

    let dots = s.matches('.').count();
    let commas = s.matches(',').count();

    let normalized = match (dots, commas) {
        (0, 0) => s.to_string(),
        (d, 0) if d > 1 => s.replace('.', ""),
        (0, c) if c > 1 => s.replace(',', ""),
        (1, 0) => single_separator(s, '.'),
        (0, 1) => single_separator(s, ','),
        _ => {
            let last_dot = s.rfind('.')?;
            let last_comma = s.rfind(',')?;
            if last_dot > last_comma {
                s.replace(',', "")
            } else {
                s.replace('.', "").replace(',', ".")
            }
        }
    };

    normalized.parse().ok()
}

fn single_separator(s: &str, sep: char) -> String {
    match s.split_once(sep) {
        Some((int, frac)) if frac.len() == 3 => format!("{int}{frac}"),
        Some((int, frac)) => format!("{int}.{frac}"),
        None => s.to_string(),
    }
}

fn parse_count(token: &str) -> Option<u32> {
    if let Ok(n) = token.parse() {
        return Some(n);
    }
    match token.to_lowercase().as_str() {
        "un" | "una" | "uno" => Some(1),
        "dos" => Some(2),
        "tres" => Some(3),
        "cuatro" => Some(4),
        "cinco" => Some(5),
        "seis" => Some(6),
        _ => None,
    }
}

/// Rules without a capture group count as one.
fn first_count(rules: &[Regex], text: &str) -> Option<u32> {
    let caps = first_match(rules, text)?;
    match caps.get(1) {
        Some(m) => parse_count(m.as_str()),
        None => Some(1),
    }
}

fn first_area(rules: &[Regex], text: &str) -> Option<f64> {
    let caps = first_match(rules, text)?;
    parse_number(caps.get(1)?.as_str()).filter(|v| *v > 0.0)
}

fn first_match<'t>(rules: &[Regex], text: &'t str) -> Option<Captures<'t>> {
    rules.iter().find_map(|re| re.captures(text))
}

struct FlagRules {
    alberca: Regex,
    patio: Regex,
    bodega: Regex,
    terraza: Regex,
    cisterna: Regex,
    jardin: Regex,
    roof_garden: Regex,
    seguridad: Regex,
    escrituras: Regex,
    cesion_derechos: Regex,
    credito: Regex,
    contado: Regex,
}

struct Rules {
    price: Regex,
    property_types: Vec<(TipoPropiedad, Regex)>,
    recamaras: Vec<Regex>,
    banos: Vec<Regex>,
    medio_bano: Vec<Regex>,
    niveles: Vec<Regex>,
    estacionamientos: Vec<Regex>,
    superficie: Vec<Regex>,
    construccion: Vec<Regex>,
    flags: FlagRules,
}

// Counts may be written as digits or as small Spanish number words.
const NUM: &str = r"(\d+|una?|uno|dos|tres|cuatro|cinco|seis)";
const AREA: &str = r"(\d[\d.,]*)";
const M2: &str = r"(?:m2|m²|mts?2?|metros(?:\s+cuadrados)?)";

fn re(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){pattern}")).expect("extraction rule must compile")
}

fn res(patterns: &[String]) -> Vec<Regex> {
    patterns.iter().map(|p| re(p)).collect()
}

fn rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(Rules::compile)
}

impl Rules {
    fn compile() -> Self {
        Rules {
            price: re(r"(\d[\d.,]*)(?:\s*(millones|mill[oó]n|mdp|mil|mm|k|m)\b)?"),
            property_types: vec![
                (
                    TipoPropiedad::Casa,
                    re(r"\b(?:casas?|residencias?|chalets?|townhouses?|vivienda)\b"),
                ),
                (
                    TipoPropiedad::Departamento,
                    re(r"\b(?:departamentos?|deptos?|dptos?|apartamentos?|penthouse|pent\s+house|lofts?)\b"),
                ),
                (
                    TipoPropiedad::Terreno,
                    re(r"\b(?:terrenos?|lotes?|predios?|parcelas?|hect[aá]reas?)\b"),
                ),
                (
                    TipoPropiedad::Local,
                    re(r"\b(?:local(?:es)?|plaza\s+comercial)\b"),
                ),
                (
                    TipoPropiedad::Oficina,
                    re(r"\b(?:oficinas?|consultorios?|despachos?)\b"),
                ),
                (
                    TipoPropiedad::Bodega,
                    re(r"\b(?:bodegas?|naves?\s+industrial(?:es)?)\b"),
                ),
            ],
            recamaras: res(&[
                format!(r"\b{NUM}\s*(?:rec[aá]maras?|habitaciones|habitaci[oó]n|dormitorios?|cuartos?)\b"),
                r"\b(\d+)\s*recs?\b".to_string(),
                r"(?:rec[aá]maras?|habitaciones|dormitorios)\s*:\s*(\d+)".to_string(),
            ]),
            banos: res(&[
                format!(r"\b{NUM}(?:[.,]5)?\s*ba[ñn]os?\b"),
                r"ba[ñn]os?\s*(?:completos?\s*)?:\s*(\d+)".to_string(),
            ]),
            medio_bano: res(&[
                format!(r"\b{NUM}\s*medios?\s+ba[ñn]os?\b"),
                r"\b\d+\s*ba[ñn]os?\s*(?:completos?\s*)?(?:y|,)\s*(?:un\s+)?medio\b".to_string(),
                r"\b\d+[.,]5\s*ba[ñn]os?\b".to_string(),
                r"\bmedio\s+ba[ñn]o\b".to_string(),
            ]),
            niveles: res(&[
                format!(r"\b{NUM}\s*(?:niveles|nivel|plantas?|pisos)\b"),
                r"niveles?\s*:\s*(\d+)".to_string(),
                r"\b(?:un\s+solo\s+nivel|una\s+sola\s+planta|planta\s+[uú]nica)\b".to_string(),
            ]),
            estacionamientos: res(&[
                format!(r"\b{NUM}\s*(?:estacionamientos?|caj[oó]n(?:es)?)\b"),
                format!(r"\b{NUM}\s*lugares?\s+de\s+estacionamiento"),
                format!(r"(?:cochera|garage|garaje|estacionamiento)\s+(?:techad[oa]\s+)?(?:para|de)\s+{NUM}\s*(?:autos?|carros?|coches?|veh[ií]culos?)"),
                format!(r"\b{NUM}\s*(?:autos?|carros?|coches?)\b"),
            ]),
            superficie: res(&[
                format!(r"superficie(?:\s+(?:de\s+)?terreno|\s+total)?\s*(?:de\s*)?:?\s*{AREA}"),
                format!(r"\bterreno\s*(?:de\s*|:\s*)?{AREA}\s*{M2}"),
                format!(r"{AREA}\s*{M2}\s+de\s+terreno"),
            ]),
            construccion: res(&[
                format!(r"construcci[oó]n\s*(?:de\s*)?:?\s*{AREA}"),
                format!(r"(?:superficie|[aá]rea)\s+construida\s*(?:de\s*)?:?\s*{AREA}"),
                format!(r"{AREA}\s*{M2}\s+(?:de\s+)?constru(?:cci[oó]n|id[oa]s?)"),
            ]),
            flags: FlagRules {
                alberca: re(r"alberca|piscina"),
                patio: re(r"\bpatio"),
                bodega: re(r"bodega"),
                terraza: re(r"terraza"),
                cisterna: re(r"cisterna|aljibe"),
                jardin: re(r"jard[ií]n|[aá]rea\s+verde"),
                roof_garden: re(r"roof[\s-]?garden|roof[\s-]?top"),
                seguridad: re(r"seguridad|vigilancia|caseta|acceso\s+controlado"),
                escrituras: re(r"escritura"),
                cesion_derechos: re(r"cesi[oó]n\s+de\s+derechos|traspaso"),
                credito: re(r"cr[eé]dito|infonavit|fovissste"),
                contado: re(r"\bcontado\b|efectivo"),
            },
        }
    }
}
