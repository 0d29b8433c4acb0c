use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A scraped posting as it sits in the raw repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawListing {
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, alias = "title", skip_serializing_if = "Option::is_none")]
    pub titulo: Option<String>,
    #[serde(
        default,
        rename = "descripcion",
        alias = "description",
        alias = "descripcion_raw",
        skip_serializing_if = "Option::is_none"
    )]
    pub descripcion: Option<String>,
    // Price text, e.g. "$1,200,000". Numbers are accepted and kept as text.
    #[serde(
        default,
        alias = "price",
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub precio: Option<String>,
    #[serde(default, alias = "operacion", skip_serializing_if = "Option::is_none")]
    pub tipo_operacion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ciudad: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colonia: Option<String>,
    #[serde(default, alias = "ubicacion", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, alias = "url", skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imagen_portada: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imagenes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendedor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_vendedor: Option<String>,
}

impl RawListing {
    /// Reads a repository record. Older scraper output nests some fields in objects
    /// (`precio: {texto, valor}`, `tipo_operacion: {tipo}`, `ubicacion: {ciudad, ...}`);
    /// those are unwrapped first.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Object(map) => RawListing::deserialize(&Value::Object(flatten_record(map))),
            other => RawListing::deserialize(other),
        }
    }

    /// Source id with surrounding whitespace removed; `None` when absent or blank.
    pub fn source_id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }

    pub fn title(&self) -> &str {
        self.titulo.as_deref().unwrap_or("")
    }

    pub fn description(&self) -> &str {
        self.descripcion.as_deref().unwrap_or("")
    }
}

// Alternative names, canonical field first.
const ALIASES: [(&str, &[&str]); 6] = [
    ("titulo", &["title"]),
    ("descripcion", &["description", "descripcion_raw"]),
    ("precio", &["price"]),
    ("tipo_operacion", &["operacion"]),
    ("location", &["ubicacion"]),
    ("link", &["url"]),
];

/// First non-empty scalar under one of `keys`.
fn nested_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<Value> {
    keys.iter().find_map(|k| match obj.get(*k)? {
        Value::String(s) if !s.trim().is_empty() => Some(Value::String(s.clone())),
        Value::Number(n) => Some(Value::Number(n.clone())),
        _ => None,
    })
}

/// Replaces an object-valued field with its first text under `keys`, or drops it.
fn unwrap_object(out: &mut Map<String, Value>, field: &str, keys: &[&str]) {
    let text = match out.get(field) {
        Some(Value::Object(obj)) => nested_text(obj, keys),
        _ => return,
    };
    match text {
        Some(text) => {
            out.insert(field.to_string(), text);
        }
        None => {
            out.remove(field);
        }
    }
}

fn flatten_record(map: &Map<String, Value>) -> Map<String, Value> {
    let mut out = map.clone();

    // one name per field; the canonical one wins, then the first alias present
    for (canonical, aliases) in ALIASES {
        let mut names = std::iter::once(canonical).chain(aliases.iter().copied());
        let Some(keep) = names.find(|n| out.contains_key(*n)) else {
            continue;
        };
        let value = out.remove(keep).unwrap_or(Value::Null);
        for alias in aliases {
            out.remove(*alias);
        }
        out.insert(canonical.to_string(), value);
    }

    unwrap_object(&mut out, "precio", &["texto_original", "texto", "valor"]);
    unwrap_object(&mut out, "tipo_operacion", &["tipo"]);
    unwrap_object(&mut out, "descripcion", &["texto_original", "texto_limpio", "texto"]);

    if let Some(Value::Object(ubicacion)) = out.get("location").cloned() {
        for field in ["ciudad", "estado", "colonia"] {
            let missing = match out.get(field) {
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(Value::Null) | None => true,
                Some(_) => false,
            };
            if missing {
                if let Some(v) = nested_text(&ubicacion, &[field]) {
                    out.insert(field.to_string(), v);
                }
            }
        }
        unwrap_object(&mut out, "location", &["texto_original", "direccion_completa"]);
    }

    // locally downloaded cover images are not servable
    if out.get("imagen_portada").is_some_and(|v| !v.is_string()) {
        out.remove("imagen_portada");
    }

    out
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Text {
        Str(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Text>::deserialize(deserializer)? {
        None => None,
        Some(Text::Str(s)) => Some(s),
        Some(Text::Int(n)) => Some(n.to_string()),
        Some(Text::Float(n)) => Some(n.to_string()),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Moneda {
    #[serde(rename = "MXN")]
    Mxn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TipoOperacion {
    Venta,
    Renta,
}

impl TipoOperacion {
    /// Only the exact literals are classified; no case folding, no inference.
    pub fn from_source(raw: Option<&str>) -> Option<Self> {
        match raw? {
            "Venta" => Some(TipoOperacion::Venta),
            "Renta" => Some(TipoOperacion::Renta),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TipoPropiedad {
    Casa,
    Departamento,
    Terreno,
    Local,
    Oficina,
    Bodega,
}

impl fmt::Display for TipoOperacion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TipoOperacion::Venta => write!(f, "Venta"),
            TipoOperacion::Renta => write!(f, "Renta"),
        }
    }
}

impl fmt::Display for TipoPropiedad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TipoPropiedad::Casa => "Casa",
            TipoPropiedad::Departamento => "Departamento",
            TipoPropiedad::Terreno => "Terreno",
            TipoPropiedad::Local => "Local",
            TipoPropiedad::Oficina => "Oficina",
            TipoPropiedad::Bodega => "Bodega",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amenidades {
    pub alberca: bool,
    pub patio: bool,
    pub bodega: bool,
    pub terraza: bool,
    pub cisterna: bool,
    pub jardin: bool,
    pub roof_garden: bool,
    pub seguridad: bool,
}

impl Amenidades {
    pub const NAMES: [&'static str; 8] = [
        "alberca",
        "patio",
        "bodega",
        "terraza",
        "cisterna",
        "jardin",
        "roof_garden",
        "seguridad",
    ];

    /// Flag by name; `None` for names that are not amenities.
    pub fn get(&self, name: &str) -> Option<bool> {
        match name {
            "alberca" => Some(self.alberca),
            "patio" => Some(self.patio),
            "bodega" => Some(self.bodega),
            "terraza" => Some(self.terraza),
            "cisterna" => Some(self.cisterna),
            "jardin" => Some(self.jardin),
            "roof_garden" => Some(self.roof_garden),
            "seguridad" => Some(self.seguridad),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Legal {
    pub escrituras: bool,
    pub cesion_derechos: bool,
    pub credito: bool,
    pub contado: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedListing {
    pub id: String,
    pub precio: Option<f64>,
    pub moneda: Option<Moneda>,
    pub tipo_operacion: Option<TipoOperacion>,
    pub tipo_propiedad: Option<TipoPropiedad>,

    pub colonia: Option<String>,
    pub ciudad: Option<String>,
    pub estado: Option<String>,

    pub recamaras: Option<u32>,
    pub banos: Option<u32>,
    pub medio_bano: Option<u32>,
    pub niveles: Option<u32>,
    pub estacionamientos: Option<u32>,
    pub superficie_m2: Option<f64>,
    pub construccion_m2: Option<f64>,

    #[serde(flatten)]
    pub amenidades: Amenidades,
    pub es_un_nivel: Option<bool>,
    pub legal: Legal,
}
