use crate::auth::magic::{MagicLinkConfig, MagicLinkService};
use crate::auth::sessions::{
    clear_session_cookie, load_user_from_session, revoke_session, session_cookie, SessionUser,
    SESSION_COOKIE,
};
use crate::contact::{submit_contact, ContactForm};
use crate::db::favorites::{add_favorite, is_favorite, list_favorites, remove_favorite};
use crate::domain::query::ListingQuery;
use crate::errors::ServerError;
use crate::responses::{
    html_error_response, html_response, html_response_status, json_error_response, json_response,
    redirect, static_asset, ResultResp,
};
use crate::state::AppState;
use crate::templates::pages;
use astra::{Request, Response};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::HashMap;
use std::io::Read;
use tracing::{debug, info};

const MAX_BODY_BYTES: u64 = 64 * 1024;
const SEARCH_LIMIT: usize = 50;

/// Entry point for the server: never fails, errors become JSON under /api and HTML elsewhere.
pub fn respond(req: Request, state: &AppState) -> Response {
    let is_api = req.uri().path().starts_with("/api/");
    let token = session_token(&req);

    match handle(req, state) {
        Ok(resp) => resp,
        Err(err) if is_api => json_error_response(err),
        Err(err) => {
            let user = token
                .and_then(|t| lookup_user(state, &t).ok().flatten())
                .map(|u| u.email);
            html_error_response(err, user.as_deref())
        }
    }
}

pub fn handle(mut req: Request, state: &AppState) -> ResultResp {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let pairs = query_pairs(&req);
    let query: HashMap<String, String> = pairs.iter().cloned().collect();
    let user = match session_token(&req) {
        Some(token) => lookup_user(state, &token)?,
        None => None,
    };
    let email = user.as_ref().map(|u| u.email.as_str());
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    debug!(%method, %path, "request");

    match (method.as_str(), segments.as_slice()) {
        ("GET", []) => {
            let stats = state.catalog.stats();
            let ciudades: Vec<&str> = stats
                .por_ciudad
                .keys()
                .map(String::as_str)
                .filter(|c| *c != "Sin ciudad")
                .collect();
            html_response(pages::home_page(email, &ciudades, state.catalog.len()))
        }
        ("GET", ["static", name]) => static_asset(name),
        ("GET", ["health"]) => json_response(
            200,
            &json!({
                "status": "ok",
                "propiedades_cargadas": state.catalog.len(),
                "timestamp": Utc::now().to_rfc3339(),
            }),
        ),
        ("GET", ["catalogo.json"]) => json_response(200, state.catalog.document()),

        ("GET", ["api", "propiedades"]) => {
            let q = ListingQuery::from_pairs(pairs.iter().map(|(k, v)| (k, v)))
                .map_err(|e| ServerError::BadRequest(e.to_string()))?;
            json_response(200, &state.catalog.search(&q))
        }
        ("GET", ["api", "propiedades", id]) => {
            let entry = state.catalog.entry(id).ok_or(ServerError::NotFound)?;
            json_response(200, entry)
        }
        ("GET", ["api", "estadisticas"]) => json_response(200, &state.catalog.stats()),
        ("GET", ["api", "buscar"]) => {
            let q = query.get("q").map(String::as_str).unwrap_or("");
            let hits = state
                .catalog
                .text_search(q, SEARCH_LIMIT)
                .map_err(|e| ServerError::BadRequest(e.to_string()))?;
            json_response(
                200,
                &json!({ "q": q.trim(), "total": hits.len(), "propiedades": hits }),
            )
        }

        ("GET", ["propiedades", id]) => {
            let card = state.catalog.get(id).ok_or(ServerError::NotFound)?;
            let favorite = match &user {
                Some(u) => state.db.with_conn(|conn| is_favorite(conn, u.id, id))?,
                None => false,
            };
            html_response(pages::property_page(card, email, favorite))
        }
        ("POST", ["propiedades", id, "favorito"]) => {
            let Some(u) = &user else {
                return redirect("/login", None);
            };
            if !state.catalog.contains(id) {
                return Err(ServerError::NotFound);
            }
            let form: HashMap<String, String> = read_body(&mut req)?;
            let remove = form.get("accion").map(String::as_str) == Some("quitar");
            let now = Utc::now().timestamp();
            state.db.with_conn(|conn| {
                if remove {
                    remove_favorite(conn, u.id, id).map(|_| ())
                } else {
                    add_favorite(conn, u.id, id, now).map(|_| ())
                }
            })?;
            redirect(&format!("/propiedades/{id}"), None)
        }
        ("POST", ["propiedades", id, "contacto"]) => {
            let mut form: ContactForm = read_body(&mut req)?;
            form.propiedad_id = id.to_string();
            let user_id = user.as_ref().map(|u| u.id);
            let outcome = submit_contact(state, user_id, &form, Utc::now().timestamp())?;
            let card = state.catalog.get(id).ok_or(ServerError::NotFound)?;
            html_response_status(201, pages::contact_sent_page(card, &outcome, email))
        }

        ("GET", ["login"]) => html_response(pages::login_page(email)),
        ("POST", ["auth", "request-link"]) => {
            let form: HashMap<String, String> = read_body(&mut req)?;
            let raw_email = form.get("email").map(String::as_str).unwrap_or("");
            let service = MagicLinkService::new(MagicLinkConfig::default());
            let now = Utc::now().timestamp();
            let issued = state
                .db
                .with_conn(|conn| service.request_link(conn, raw_email, now))?;

            let link = format!(
                "{}{}",
                state.config.public_base_url.trim_end_matches('/'),
                issued.link
            );
            info!(email = %issued.email, user_id = issued.user_id, %link, "magic link issued");

            let dev_link = state.config.dev_mode.then_some(link.as_str());
            html_response(pages::check_email_page(&issued.email, dev_link))
        }
        ("GET", ["auth", "magic"]) => {
            let token = query.get("token").map(String::as_str).unwrap_or("");
            let service = MagicLinkService::new(MagicLinkConfig::default());
            let now = Utc::now().timestamp();
            let signed_in = state.db.with_conn(|conn| service.redeem(conn, token, now))?;

            info!(user_id = signed_in.user_id, "signed in");
            redirect(
                "/favoritos",
                Some(session_cookie(&signed_in.session_token, state.config.cookie_secure)),
            )
        }
        ("POST", ["auth", "logout"]) => {
            if let Some(token) = session_token(&req) {
                let now = Utc::now().timestamp();
                state.db.with_conn(|conn| revoke_session(conn, &token, now))?;
            }
            redirect("/", Some(clear_session_cookie(state.config.cookie_secure)))
        }

        ("GET", ["favoritos"]) => {
            let Some(u) = &user else {
                return redirect("/login", None);
            };
            let ids = state.db.with_conn(|conn| list_favorites(conn, u.id))?;
            let cards: Vec<_> = ids.iter().filter_map(|id| state.catalog.get(id)).collect();
            let missing = ids.len() - cards.len();
            html_response(pages::favorites_page(&u.email, &cards, missing))
        }
        ("GET", ["api", "favoritos"]) => {
            let u = require_user(&user)?;
            let ids = state.db.with_conn(|conn| list_favorites(conn, u.id))?;
            json_response(200, &json!({ "favoritos": ids }))
        }
        ("POST", ["api", "favoritos", id]) => {
            let u = require_user(&user)?;
            if !state.catalog.contains(id) {
                return Err(ServerError::NotFound);
            }
            let now = Utc::now().timestamp();
            let added = state.db.with_conn(|conn| add_favorite(conn, u.id, id, now))?;
            let status = if added { 201 } else { 200 };
            json_response(status, &json!({ "propiedad_id": id, "favorito": true }))
        }
        ("DELETE", ["api", "favoritos", id]) => {
            let u = require_user(&user)?;
            let removed = state.db.with_conn(|conn| remove_favorite(conn, u.id, id))?;
            if !removed {
                return Err(ServerError::NotFound);
            }
            json_response(200, &json!({ "propiedad_id": id, "favorito": false }))
        }

        ("POST", ["api", "contacto"]) => {
            let form: ContactForm = read_body(&mut req)?;
            let user_id = user.as_ref().map(|u| u.id);
            let outcome = submit_contact(state, user_id, &form, Utc::now().timestamp())?;
            json_response(201, &outcome)
        }

        _ => Err(ServerError::NotFound),
    }
}

fn require_user(user: &Option<SessionUser>) -> Result<&SessionUser, ServerError> {
    user.as_ref()
        .ok_or_else(|| ServerError::Unauthorized("inicia sesión para continuar".into()))
}

fn lookup_user(state: &AppState, token: &str) -> Result<Option<SessionUser>, ServerError> {
    let now = Utc::now().timestamp();
    state
        .db
        .with_conn(|conn| load_user_from_session(conn, token, now))
}

fn session_token(req: &Request) -> Option<String> {
    req.headers()
        .get_all("cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Decoded query string pairs in order. Repeated keys are kept.
fn query_pairs(req: &Request) -> Vec<(String, String)> {
    req.uri()
        .query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// Decodes a JSON or urlencoded form body, depending on `Content-Type`.
fn read_body<T: DeserializeOwned>(req: &mut Request) -> Result<T, ServerError> {
    let is_json = req
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    let mut bytes = Vec::new();
    req.body_mut()
        .reader()
        .take(MAX_BODY_BYTES + 1)
        .read_to_end(&mut bytes)
        .map_err(|_| ServerError::BadRequest("no se pudo leer el cuerpo".into()))?;
    if bytes.len() as u64 > MAX_BODY_BYTES {
        return Err(ServerError::BadRequest("cuerpo demasiado grande".into()));
    }

    if is_json {
        serde_json::from_slice(&bytes)
            .map_err(|e| ServerError::BadRequest(format!("JSON inválido: {e}")))
    } else {
        let fields = url::form_urlencoded::parse(&bytes)
            .into_owned()
            .map(|(k, v)| (k, serde_json::Value::String(v)))
            .collect();
        let value = serde_json::Value::Object(fields);
        serde_json::from_value(value)
            .map_err(|e| ServerError::BadRequest(format!("formulario inválido: {e}")))
    }
}
