use crate::router::{handle, respond};
use crate::tests::utils::{get, init_test_app, post_form, read_body, read_json, send, signed_in_user};
use astra::Body;
use http::{Method, Request};

fn api(method: Method, uri: &str, token: &str) -> Request<Body> {
    send(method, uri, "application/json", "", Some(token))
}

#[test]
fn favorites_page_redirects_when_signed_out() {
    let app = init_test_app();

    let resp = handle(get("/favoritos", None), &app.state).unwrap();
    assert_eq!(resp.status(), 302);
    assert_eq!(resp.headers().get("location").unwrap(), "/login");
}

#[test]
fn favorites_api_requires_session() {
    let app = init_test_app();

    let resp = respond(get("/api/favoritos", None), &app.state);
    assert_eq!(resp.status(), 401);
    assert!(read_json(resp)["error"].is_string());
}

#[test]
fn add_list_and_remove_favorite() {
    let app = init_test_app();
    let (_, token) = signed_in_user(&app.state, "fav@example.com");

    let resp = handle(api(Method::POST, "/api/favoritos/1001", &token), &app.state).unwrap();
    assert_eq!(resp.status(), 201);

    // adding twice is not an error
    let resp = handle(api(Method::POST, "/api/favoritos/1001", &token), &app.state).unwrap();
    assert_eq!(resp.status(), 200);

    let json = read_json(handle(get("/api/favoritos", Some(&token)), &app.state).unwrap());
    assert_eq!(json["favoritos"], serde_json::json!(["1001"]));

    let body = read_body(handle(get("/favoritos", Some(&token)), &app.state).unwrap());
    assert!(body.contains("Casa en venta con alberca"));

    let resp = handle(api(Method::DELETE, "/api/favoritos/1001", &token), &app.state).unwrap();
    assert_eq!(resp.status(), 200);

    let json = read_json(handle(get("/api/favoritos", Some(&token)), &app.state).unwrap());
    assert_eq!(json["favoritos"], serde_json::json!([]));

    let resp = respond(api(Method::DELETE, "/api/favoritos/1001", &token), &app.state);
    assert_eq!(resp.status(), 404);
}

#[test]
fn unknown_listing_cannot_be_favorited() {
    let app = init_test_app();
    let (_, token) = signed_in_user(&app.state, "fav@example.com");

    let resp = respond(api(Method::POST, "/api/favoritos/999", &token), &app.state);
    assert_eq!(resp.status(), 404);
}

#[test]
fn detail_page_form_toggles_favorite() {
    let app = init_test_app();
    let (_, token) = signed_in_user(&app.state, "fav@example.com");

    let resp = handle(post_form("/propiedades/1002/favorito", "accion=agregar", Some(&token)), &app.state).unwrap();
    assert_eq!(resp.status(), 302);
    assert_eq!(resp.headers().get("location").unwrap(), "/propiedades/1002");

    let body = read_body(handle(get("/propiedades/1002", Some(&token)), &app.state).unwrap());
    assert!(body.contains("Quitar de favoritos"));

    handle(post_form("/propiedades/1002/favorito", "accion=quitar", Some(&token)), &app.state).unwrap();
    let body = read_body(handle(get("/propiedades/1002", Some(&token)), &app.state).unwrap());
    assert!(body.contains("Guardar en favoritos"));
}
