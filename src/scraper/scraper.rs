// scraper.rs
use crate::config::AppConfig;
use crate::domain::listing::RawListing;
use crate::scraper::models::{load_links, parse_location, ListingLink, MARKETPLACE_BASE};
use crate::scraper::repository::Repository;
use crate::scraper::ScraperError;
use rand::Rng;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, COOKIE};
use reqwest::StatusCode;
use scraper::{ElementRef, Html, Selector};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use url::Url;

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0 Safari/537.36";

/// Repository is flushed to disk every this many scraped listings.
const SAVE_EVERY: usize = 20;
const MAX_IMAGES: usize = 10;

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Raw `Cookie` header of a logged-in browser session.
    pub cookie: Option<String>,
    /// Pause between listing pages.
    pub delay: Duration,
    pub max_attempts: u64,
}

impl ScraperConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            cookie: config.fb_cookie.clone(),
            delay: Duration::from_millis(config.scraper_delay_ms),
            max_attempts: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub attempted: usize,
    pub scraped: usize,
    pub failed: usize,
}

pub struct MarketplaceScraper {
    client: Client,
    config: ScraperConfig,
}

impl MarketplaceScraper {
    pub fn new(config: ScraperConfig) -> Result<Self, ScraperError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("es-MX,es;q=0.9"));
        if let Some(cookie) = &config.cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|_| ScraperError::Config("FB_COOKIE is not a valid header value".into()))?;
            headers.insert(COOKIE, value);
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Scrapes each link in order and hands every parsed listing to `on_listing`.
    /// A failing link is logged and counted; an error from `on_listing` stops the run.
    pub fn scrape_links<F>(
        &self,
        links: &[ListingLink],
        mut on_listing: F,
    ) -> Result<ScrapeSummary, ScraperError>
    where
        F: FnMut(RawListing) -> Result<(), ScraperError>,
    {
        let mut summary = ScrapeSummary::default();

        for (i, link) in links.iter().enumerate() {
            if i > 0 && !self.config.delay.is_zero() {
                std::thread::sleep(self.config.delay);
            }

            summary.attempted += 1;
            info!(n = i + 1, total = links.len(), url = %link.url, "scraping listing");

            match self.fetch_listing(link) {
                Ok(listing) => {
                    summary.scraped += 1;
                    on_listing(listing)?;
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!(id = %link.id, error = %e, "listing failed");
                }
            }
        }

        Ok(summary)
    }

    pub fn fetch_listing(&self, link: &ListingLink) -> Result<RawListing, ScraperError> {
        let html = self.fetch_html(&link.url)?;
        parse_listing_html(&html, link)
    }

    pub fn fetch_html(&self, url: &str) -> Result<String, ScraperError> {
        const MAX_BACKOFF_SECS: u64 = 10;
        const JITTER_MAX_SECS: u64 = 2;

        let attempts = self.config.max_attempts.max(1);
        let mut last_err = None;

        for attempt in 1..=attempts {
            let start = Instant::now();

            match self.try_fetch_html(url) {
                Ok(html) => {
                    debug!(attempt, elapsed = ?start.elapsed(), "fetched listing page");
                    return Ok(html);
                }
                // Not worth retrying: the page is gone or we're not allowed in.
                Err(e @ (ScraperError::Blocked(_) | ScraperError::MissingContent(_))) => {
                    return Err(e)
                }
                Err(e) => {
                    warn!(attempt, elapsed = ?start.elapsed(), error = %e, "fetch attempt failed");
                    last_err = Some(e);

                    if attempt < attempts {
                        let base = std::cmp::min(2 * attempt, MAX_BACKOFF_SECS);
                        let jitter = rand::thread_rng().gen_range(0..=JITTER_MAX_SECS);
                        std::thread::sleep(Duration::from_secs(base + jitter));
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| ScraperError::Network("retry loop failed".into())))
    }

    fn try_fetch_html(&self, url: &str) -> Result<String, ScraperError> {
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        let text = resp.text()?;

        match status {
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => {
                Err(ScraperError::Blocked(format!("HTTP {status}")))
            }
            StatusCode::NOT_FOUND | StatusCode::GONE => {
                Err(ScraperError::MissingContent(url.to_string()))
            }
            s if !s.is_success() => Err(ScraperError::Network(format!("HTTP {s} for {url}"))),
            _ => Ok(text),
        }
    }
}

fn selector(css: &str) -> Result<Selector, ScraperError> {
    Selector::parse(css).map_err(|e| ScraperError::HtmlParse(e.to_string()))
}

fn joined_text(el: ElementRef<'_>, sep: &str) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

/// Pulls a RawListing out of a marketplace listing page.
pub fn parse_listing_html(html: &str, link: &ListingLink) -> Result<RawListing, ScraperError> {
    let doc = Html::parse_document(html);

    let titulo = doc
        .select(&selector("h1")?)
        .map(|h| joined_text(h, " "))
        .find(|t| !t.is_empty());

    let descripcion = extract_description(&doc)?;

    if titulo.is_none() && descripcion.is_none() {
        if html.contains("login_form") {
            return Err(ScraperError::Blocked("login wall".into()));
        }
        return Err(ScraperError::MissingContent(link.url.clone()));
    }

    let spans: Vec<String> = doc
        .select(&selector("span")?)
        .map(|s| joined_text(s, " "))
        .collect();

    let precio = spans
        .iter()
        .find(|t| t.starts_with('$') && t.chars().count() < 30)
        .cloned();

    let location = spans.iter().find_map(|t| {
        parse_location(t).map(|(city, state)| (t.clone(), city, state))
    });

    let (vendedor, link_vendedor) = extract_seller(&doc)?;

    let mut imagenes: Vec<String> = Vec::new();
    for img in doc.select(&selector("img[src]")?) {
        let Some(src) = img.value().attr("src") else {
            continue;
        };
        if src.starts_with("http") && !imagenes.iter().any(|i| i == src) {
            imagenes.push(src.to_string());
        }
        if imagenes.len() == MAX_IMAGES {
            break;
        }
    }

    let (location_text, ciudad, estado) = match location {
        Some((text, city, state)) => (Some(text), Some(city), Some(state.to_string())),
        None => (None, link.ciudad.clone(), None),
    };

    Ok(RawListing {
        id: Some(link.id.clone()),
        titulo,
        descripcion,
        precio,
        tipo_operacion: link.tipo_operacion.clone(),
        ciudad,
        estado,
        colonia: None,
        location: location_text,
        link: Some(link.url.clone()),
        imagen_portada: imagenes.first().cloned(),
        imagenes,
        vendedor,
        link_vendedor,
    })
}

/// Text of the block that follows the "Descripción"/"Detalles" label.
fn extract_description(doc: &Html) -> Result<Option<String>, ScraperError> {
    for div in doc.select(&selector("div")?) {
        let label: String = div.text().collect();
        if !matches!(label.trim(), "Descripción" | "Detalles") {
            continue;
        }
        let Some(next) = div.next_siblings().find_map(ElementRef::wrap) else {
            continue;
        };
        let text = joined_text(next, "\n").replace("Ver menos", "");
        let text = text.trim();
        if !text.is_empty() {
            return Ok(Some(text.to_string()));
        }
    }
    Ok(None)
}

fn extract_seller(doc: &Html) -> Result<(Option<String>, Option<String>), ScraperError> {
    let base = Url::parse(MARKETPLACE_BASE).map_err(|e| ScraperError::Config(e.to_string()))?;
    let strong = selector("strong")?;

    for a in doc.select(&selector("a[href]")?) {
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        if !href.contains("profile.php?id=") {
            continue;
        }
        let link = base
            .join(href)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string());
        let link = link.split('&').next().unwrap_or(&link).to_string();

        let name = a
            .select(&strong)
            .map(|s| joined_text(s, " "))
            .next()
            .unwrap_or_else(|| joined_text(a, " "));

        return Ok(((!name.is_empty()).then_some(name), Some(link)));
    }

    Ok((None, None))
}

/// `scrape` subcommand: fetch every link and merge the results into the repository.
pub fn run_marketplace_scrape(
    config: &AppConfig,
    links_path: &Path,
    output: &Path,
    limit: Option<usize>,
) -> Result<ScrapeSummary, ScraperError> {
    let mut links = load_links(links_path)?;
    if let Some(limit) = limit {
        links.truncate(limit);
    }
    info!(links = links.len(), output = %output.display(), "starting marketplace scrape");

    let scraper = MarketplaceScraper::new(ScraperConfig::from_app(config))?;
    let mut repo = Repository::open(output)?;
    let before = repo.len();
    if repo.unkeyed_len() > 0 {
        warn!(
            unkeyed = repo.unkeyed_len(),
            "repository has records without id, it will be saved as an array"
        );
    }
    let mut since_save = 0;

    let result = scraper.scrape_links(&links, |listing| {
        repo.upsert(&listing)?;
        since_save += 1;
        if since_save >= SAVE_EVERY {
            repo.save()?;
            since_save = 0;
        }
        Ok(())
    });

    // Keep whatever was scraped even when the run stopped early.
    repo.save()?;

    match &result {
        Ok(summary) => info!(
            attempted = summary.attempted,
            scraped = summary.scraped,
            failed = summary.failed,
            new_entries = repo.len().saturating_sub(before),
            "scrape complete"
        ),
        Err(e) => error!(error = %e, "scrape aborted"),
    }

    result
}
