use crate::auth::sessions::create_session;
use crate::config::AppConfig;
use crate::db::auth::get_or_create_user;
use crate::db::connection::Database;
use crate::domain::catalog::{raw_records, Catalog};
use crate::domain::query::CatalogIndex;
use crate::state::AppState;
use astra::{Body, Response};
use chrono::Utc;
use http::{Method, Request};
use serde_json::json;
use std::io::Read;
use tempfile::TempDir;

/// Keeps the temp dir alive for as long as the state is used.
pub struct TestApp {
    pub state: AppState,
    _dir: TempDir,
}

pub fn now_unix() -> i64 {
    Utc::now().timestamp()
}

/// Three listings: two processed ones in Cuernavaca and Jiutepec, one without an id.
pub fn sample_catalog() -> CatalogIndex {
    let doc = json!({
        "1001": {
            "titulo": "Casa en venta con alberca",
            "descripcion": "Hermosa casa de 3 recámaras, 2 baños, alberca y jardín. Escrituras en regla.",
            "precio": "$2,500,000",
            "tipo_operacion": "Venta",
            "ciudad": "Cuernavaca",
            "estado": "Morelos",
            "link": "https://www.facebook.com/marketplace/item/1001/"
        },
        "1002": {
            "titulo": "Departamento en renta",
            "descripcion": "Departamento de 2 recámaras, 1 baño, estacionamiento.",
            "precio": "$12,000",
            "tipo_operacion": "Renta",
            "ciudad": "Jiutepec",
            "estado": "Morelos",
            "link": "https://www.facebook.com/marketplace/item/1002/"
        },
        "None": {
            "titulo": "Sin id",
            "precio": "$1"
        }
    });
    let records = raw_records(doc).expect("object document");
    CatalogIndex::new(Catalog::build(records, Utc::now()))
}

pub fn test_config(db_path: &str) -> AppConfig {
    let mut config = AppConfig::from_vars(|_| None).expect("default config");
    config.database_path = db_path.to_string();
    config.whatsapp.agency_number = Some("527771234567".to_string());
    config
}

pub fn init_test_app() -> TestApp {
    init_test_app_with(|_| {})
}

pub fn init_test_app_with(tweak: impl FnOnce(&mut AppConfig)) -> TestApp {
    let dir = tempfile::tempdir().expect("temp dir");
    let db_path = dir.path().join("test.sqlite3").to_string_lossy().to_string();

    let db = Database::new(db_path.clone());
    db.init_schema()
        .unwrap_or_else(|e| panic!("Database initialization failed: {e}"));

    let mut config = test_config(&db_path);
    tweak(&mut config);

    TestApp {
        state: AppState::new(db, sample_catalog(), config),
        _dir: dir,
    }
}

/// Creates a user and returns a valid session token for the cookie header.
pub fn signed_in_user(state: &AppState, email: &str) -> (i64, String) {
    let now = now_unix();
    state
        .db
        .with_conn(|conn| {
            let user_id = get_or_create_user(conn, email, now)?;
            let token = create_session(conn, user_id, now)?;
            Ok((user_id, token))
        })
        .expect("Failed to create session")
}

pub fn get(uri: &str, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = session {
        builder = builder.header("Cookie", format!("session={token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn send(
    method: Method,
    uri: &str,
    content_type: &str,
    body: &str,
    session: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", content_type);
    if let Some(token) = session {
        builder = builder.header("Cookie", format!("session={token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn post_form(uri: &str, body: &str, session: Option<&str>) -> Request<Body> {
    send(Method::POST, uri, "application/x-www-form-urlencoded", body, session)
}

pub fn read_body(resp: Response) -> String {
    let mut body = String::new();
    resp.into_body().reader().read_to_string(&mut body).unwrap();
    body
}

pub fn read_json(resp: Response) -> serde_json::Value {
    serde_json::from_str(&read_body(resp)).expect("response is JSON")
}
