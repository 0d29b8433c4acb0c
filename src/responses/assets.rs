use crate::errors::ServerError;
use crate::responses::ResultResp;
use astra::{Body, ResponseBuilder};

const CATALOGO_JS: &str = include_str!("../../static/catalogo.js");
const MAIN_CSS: &str = include_str!("../../static/main.css");

/// Assets compiled into the binary, served from `/static/<name>`.
pub fn static_asset(name: &str) -> ResultResp {
    let (body, content_type) = match name {
        "catalogo.js" => (CATALOGO_JS, "application/javascript; charset=utf-8"),
        "main.css" => (MAIN_CSS, "text/css; charset=utf-8"),
        _ => return Err(ServerError::NotFound),
    };

    ResponseBuilder::new()
        .status(200)
        .header("Content-Type", content_type)
        .header("Cache-Control", "public, max-age=3600")
        .body(Body::from(body))
        .map_err(|_| ServerError::InternalError)
}
