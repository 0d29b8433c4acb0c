use crate::scraper::ScraperError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;
use url::Url;

pub const MARKETPLACE_BASE: &str = "https://www.facebook.com/";

/// A listing page to fetch, with the context the link was collected under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingLink {
    pub url: String,
    pub id: String,
    pub ciudad: Option<String>,
    pub tipo_operacion: Option<String>,
}

// links file item
//  ├── "https://www.facebook.com/marketplace/item/123/"
//  └── { link, id?, ciudad?, tipo_operacion? }
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LinkEntry {
    Url(String),
    Detailed {
        #[serde(alias = "url")]
        link: String,
        #[serde(default)]
        id: Option<Value>,
        #[serde(default)]
        ciudad: Option<String>,
        #[serde(default, alias = "operacion")]
        tipo_operacion: Option<String>,
    },
}

/// Resolves `href` against the marketplace host and returns the cleaned URL plus the
/// id taken from its last path segment. Links to other hosts are rejected.
pub fn normalize_link(href: &str) -> Option<(String, String)> {
    let base = Url::parse(MARKETPLACE_BASE).ok()?;
    let mut url = base.join(href.trim()).ok()?;

    let host = url.host_str()?.to_ascii_lowercase();
    if host != "facebook.com" && !host.ends_with(".facebook.com") {
        return None;
    }

    url.set_query(None);
    url.set_fragment(None);

    let id = url
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()?
        .to_string();

    Some((url.to_string(), id))
}

impl ListingLink {
    fn from_entry(entry: LinkEntry) -> Option<Self> {
        let (href, id, ciudad, tipo_operacion) = match entry {
            LinkEntry::Url(href) => (href, None, None, None),
            LinkEntry::Detailed {
                link,
                id,
                ciudad,
                tipo_operacion,
            } => (link, id, ciudad, tipo_operacion),
        };

        let (url, path_id) = normalize_link(&href)?;
        let id = match id {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => path_id,
        };

        Some(ListingLink {
            url,
            id,
            ciudad,
            tipo_operacion,
        })
    }
}

/// Reads a links file (JSON array). Unusable links are skipped, duplicates by id dropped.
pub fn load_links(path: &Path) -> Result<Vec<ListingLink>, ScraperError> {
    let text = std::fs::read_to_string(path)?;
    let entries: Vec<Value> = serde_json::from_str(&text)
        .map_err(|e| ScraperError::Links(format!("{}: {e}", path.display())))?;

    let mut seen = HashSet::new();
    let mut links = Vec::with_capacity(entries.len());

    for entry in entries {
        let parsed = serde_json::from_value::<LinkEntry>(entry.clone())
            .ok()
            .and_then(ListingLink::from_entry);

        match parsed {
            Some(link) if seen.insert(link.id.clone()) => links.push(link),
            Some(link) => warn!(id = %link.id, "duplicate link skipped"),
            None => warn!(entry = %entry, "unusable link skipped"),
        }
    }

    Ok(links)
}

/// Expands Mexican state abbreviations (`Mor.` -> `Morelos`). Full names map to themselves.
pub fn expand_state(raw: &str) -> Option<&'static str> {
    let key = raw.trim().trim_end_matches('.').to_lowercase();
    let full = match key.as_str() {
        "mor" | "morelos" => "Morelos",
        "cdmx" | "df" | "d.f" | "ciudad de méxico" | "ciudad de mexico" => "Ciudad de México",
        "méx" | "mex" | "edomex" | "edo. méx" | "estado de méxico" | "estado de mexico" => {
            "Estado de México"
        }
        "gro" | "guerrero" => "Guerrero",
        "pue" | "puebla" => "Puebla",
        "qro" | "querétaro" | "queretaro" => "Querétaro",
        "jal" | "jalisco" => "Jalisco",
        "n.l" | "nl" | "nuevo león" | "nuevo leon" => "Nuevo León",
        "yuc" | "yucatán" | "yucatan" => "Yucatán",
        "q. roo" | "q.roo" | "qroo" | "q.r" | "quintana roo" => "Quintana Roo",
        "gto" | "guanajuato" => "Guanajuato",
        "hgo" | "hidalgo" => "Hidalgo",
        "tlax" | "tlaxcala" => "Tlaxcala",
        "oax" | "oaxaca" => "Oaxaca",
        "ver" | "veracruz" => "Veracruz",
        _ => return None,
    };
    Some(full)
}

/// Splits a `City, ST` line into city and expanded state.
pub fn parse_location(text: &str) -> Option<(String, &'static str)> {
    let (city, state) = text.trim().rsplit_once(',')?;
    let city = city.trim();
    if city.is_empty() || city.chars().count() > 60 || city.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((city.to_string(), expand_state(state)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn relative_links_resolve_against_marketplace() {
        let (url, id) = normalize_link("/marketplace/item/987654321/?ref=search").unwrap();
        assert_eq!(url, "https://www.facebook.com/marketplace/item/987654321/");
        assert_eq!(id, "987654321");
    }

    #[test]
    fn foreign_hosts_are_rejected() {
        assert!(normalize_link("https://example.com/marketplace/item/1/").is_none());
        assert!(normalize_link("https://m.facebook.com/marketplace/item/5").is_some());
    }

    #[test]
    fn locations_expand_state_abbreviations() {
        assert_eq!(
            parse_location("Cuernavaca, Mor."),
            Some(("Cuernavaca".to_string(), "Morelos"))
        );
        assert_eq!(
            parse_location("Emiliano Zapata, Morelos"),
            Some(("Emiliano Zapata".to_string(), "Morelos"))
        );
        assert_eq!(parse_location("$1,200,000"), None);
        assert_eq!(parse_location("Publicado hace 3 días"), None);
    }

    #[test]
    fn links_file_mixes_strings_and_objects() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                "/marketplace/item/111/",
                {{"link": "https://www.facebook.com/marketplace/item/222/", "ciudad": "Jiutepec", "tipo_operacion": "Renta"}},
                {{"url": "/marketplace/item/333/", "id": 999}},
                "https://example.com/otro",
                "/marketplace/item/111/?again=1"
            ]"#
        )
        .unwrap();

        let links = load_links(file.path()).unwrap();
        let ids: Vec<&str> = links.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["111", "222", "999"]);
        assert_eq!(links[1].tipo_operacion.as_deref(), Some("Renta"));
        assert_eq!(links[1].ciudad.as_deref(), Some("Jiutepec"));
    }
}
