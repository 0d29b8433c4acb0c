use crate::db::contacts::{get_contact, ContactStatus};
use crate::router::{handle, respond};
use crate::tests::utils::{init_test_app, post_form, read_body, read_json, send, signed_in_user};
use http::Method;

#[test]
fn json_contact_is_stored_with_whatsapp_link() {
    let app = init_test_app();

    let body = r#"{"propiedad_id":"1001","nombre":"Ana López","telefono":"777 555 1234","mensaje":"¿Sigue disponible?"}"#;
    let resp = handle(send(Method::POST, "/api/contacto", "application/json", body, None), &app.state)
        .expect("Failed to handle request");
    assert_eq!(resp.status(), 201);

    let json = read_json(resp);
    assert_eq!(json["estado"], "pendiente");
    let url = json["whatsapp_url"].as_str().unwrap();
    assert!(url.starts_with("https://wa.me/527771234567?text="));
    assert!(url.contains("1001"));

    let id = json["id"].as_i64().unwrap();
    let row = app
        .state
        .db
        .with_conn(|conn| get_contact(conn, id))
        .unwrap()
        .unwrap();
    assert_eq!(row.property_id, "1001");
    assert_eq!(row.telefono, "527775551234");
    assert_eq!(row.mensaje.as_deref(), Some("¿Sigue disponible?"));
    assert_eq!(row.estado, ContactStatus::Pendiente);
    assert_eq!(row.user_id, None);
}

#[test]
fn form_contact_links_signed_in_user() {
    let app = init_test_app();
    let (user_id, token) = signed_in_user(&app.state, "c@example.com");

    let body = "propiedad_id=1002&nombre=Luis&telefono=%2B52+777+000+1111";
    let json = read_json(handle(post_form("/api/contacto", body, Some(&token)), &app.state).unwrap());
    let id = json["id"].as_i64().unwrap();

    let row = app
        .state
        .db
        .with_conn(|conn| get_contact(conn, id))
        .unwrap()
        .unwrap();
    assert_eq!(row.user_id, Some(user_id));
    assert_eq!(row.mensaje, None);
}

#[test]
fn contact_validation_errors() {
    let app = init_test_app();

    let resp = respond(post_form("/api/contacto", "propiedad_id=999&nombre=X&telefono=7771234567", None), &app.state);
    assert_eq!(resp.status(), 404);

    let resp = respond(post_form("/api/contacto", "propiedad_id=1001&nombre=+&telefono=7771234567", None), &app.state);
    assert_eq!(resp.status(), 400);

    let resp = respond(post_form("/api/contacto", "propiedad_id=1001&nombre=Ana&telefono=123", None), &app.state);
    assert_eq!(resp.status(), 400);

    let resp = respond(post_form("/api/contacto", "nombre=Ana&telefono=7771234567", None), &app.state);
    assert_eq!(resp.status(), 400);
}

#[test]
fn contact_without_agency_number_has_no_link() {
    let app = crate::tests::utils::init_test_app_with(|cfg| cfg.whatsapp.agency_number = None);

    let json = read_json(
        handle(post_form("/api/contacto", "propiedad_id=1001&nombre=Ana&telefono=7771234567", None), &app.state)
            .unwrap(),
    );
    assert!(json["whatsapp_url"].is_null());
    assert_eq!(json["estado"], "pendiente");
}

#[test]
fn detail_page_contact_form_shows_confirmation() {
    let app = init_test_app();

    let resp = handle(post_form("/propiedades/1002/contacto", "nombre=Ana&telefono=7771234567&mensaje=", None), &app.state)
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body = read_body(resp);
    assert!(body.contains("Departamento en renta"));
    assert!(body.contains("Escribir por WhatsApp"));
}
