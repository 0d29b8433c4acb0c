use crate::router::{handle, respond};
use crate::tests::utils::{get, init_test_app, read_body, read_json};

#[test]
fn home_page_lists_cities_and_loads_script() {
    let app = init_test_app();

    let resp = handle(get("/", None), &app.state).expect("Failed to handle request");
    assert_eq!(resp.status(), 200);

    let body = read_body(resp);
    assert!(body.contains("<!DOCTYPE html>"));
    assert!(body.contains("Cuernavaca"));
    assert!(body.contains("Jiutepec"));
    assert!(body.contains("/static/catalogo.js"));
    assert!(body.contains("id=\"resultados\""));
}

#[test]
fn static_assets_are_served_with_content_type() {
    let app = init_test_app();

    let resp = handle(get("/static/catalogo.js", None), &app.state).unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/javascript; charset=utf-8"
    );
    assert!(read_body(resp).contains("/catalogo.json"));

    let resp = respond(get("/static/nope.js", None), &app.state);
    assert_eq!(resp.status(), 404);
}

#[test]
fn health_reports_loaded_listings() {
    let app = init_test_app();

    let json = read_json(handle(get("/health", None), &app.state).unwrap());
    assert_eq!(json["status"], "ok");
    assert_eq!(json["propiedades_cargadas"], 2);
    assert!(json["timestamp"].is_string());
}

#[test]
fn catalog_document_keeps_errored_entries() {
    let app = init_test_app();

    let json = read_json(handle(get("/catalogo.json", None), &app.state).unwrap());
    assert_eq!(json["propiedades"].as_array().unwrap().len(), 3);
    assert_eq!(json["estadisticas"]["total_propiedades"], 3);
    assert_eq!(json["estadisticas"]["procesadas_exitosamente"], 2);
    assert_eq!(json["estadisticas"]["con_errores"], 1);
}

#[test]
fn listings_api_filters_and_paginates() {
    let app = init_test_app();

    let json = read_json(handle(get("/api/propiedades", None), &app.state).unwrap());
    assert_eq!(json["total"], 2);
    assert_eq!(json["pagina"], 1);
    assert_eq!(json["por_pagina"], 20);
    assert_eq!(json["tiene_siguiente"], false);

    let json = read_json(
        handle(get("/api/propiedades?ciudades=cuernavaca&amenidades=alberca", None), &app.state)
            .unwrap(),
    );
    assert_eq!(json["total"], 1);
    assert_eq!(json["propiedades"][0]["id"], "1001");
    assert_eq!(json["propiedades"][0]["titulo"], "Casa en venta con alberca");

    let json = read_json(
        handle(get("/api/propiedades?orden_precio=menor_mayor&por_pagina=1", None), &app.state)
            .unwrap(),
    );
    assert_eq!(json["propiedades"].as_array().unwrap().len(), 1);
    assert_eq!(json["propiedades"][0]["id"], "1002");
    assert_eq!(json["total_paginas"], 2);
    assert_eq!(json["tiene_siguiente"], true);
}

#[test]
fn listings_api_rejects_bad_parameters_with_json_error() {
    let app = init_test_app();

    let resp = respond(get("/api/propiedades?precio_min=barato", None), &app.state);
    assert_eq!(resp.status(), 400);
    let json = read_json(resp);
    assert!(json["error"].as_str().unwrap().contains("precio_min"));
}

#[test]
fn single_listing_and_unknown_id() {
    let app = init_test_app();

    let json = read_json(handle(get("/api/propiedades/1001", None), &app.state).unwrap());
    assert_eq!(json["datos_procesados"]["id"], "1001");
    assert_eq!(json["datos_procesados"]["precio"], 2500000.0);

    let resp = respond(get("/api/propiedades/999", None), &app.state);
    assert_eq!(resp.status(), 404);
    assert_eq!(read_json(resp)["error"], "Recurso no encontrado");
}

#[test]
fn stats_include_distributions() {
    let app = init_test_app();

    let json = read_json(handle(get("/api/estadisticas", None), &app.state).unwrap());
    assert_eq!(json["total_propiedades"], 3);
    assert_eq!(json["por_ciudad"]["Cuernavaca"], 1);
    assert_eq!(json["por_operacion"]["Renta"], 1);
    assert_eq!(json["por_rango_precio"]["2M-5M"], 1);
    assert_eq!(json["por_rango_precio"]["0-500k"], 1);
}

#[test]
fn search_requires_two_characters() {
    let app = init_test_app();

    let json = read_json(handle(get("/api/buscar?q=jiutepec", None), &app.state).unwrap());
    assert_eq!(json["total"], 1);
    assert_eq!(json["propiedades"][0]["id"], "1002");

    let resp = respond(get("/api/buscar?q=a", None), &app.state);
    assert_eq!(resp.status(), 400);
}

#[test]
fn property_page_renders_details_and_forms() {
    let app = init_test_app();

    let resp = handle(get("/propiedades/1001", None), &app.state).unwrap();
    assert_eq!(resp.status(), 200);
    let body = read_body(resp);
    assert!(body.contains("Casa en venta con alberca"));
    assert!(body.contains("$2,500,000 MXN"));
    assert!(body.contains("/propiedades/1001/contacto"));
    assert!(body.contains("Inicia sesión para guardar"));
}

#[test]
fn unknown_page_renders_html_error() {
    let app = init_test_app();

    let resp = respond(get("/propiedades/nada", None), &app.state);
    assert_eq!(resp.status(), 404);
    let body = read_body(resp);
    assert!(body.contains("Error 404"));
    assert!(body.contains("Volver al catálogo"));
}
