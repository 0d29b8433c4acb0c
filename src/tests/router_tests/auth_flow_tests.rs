use crate::auth::magic::{MagicLinkConfig, MagicLinkService};
use crate::router::{handle, respond};
use crate::tests::utils::{
    get, init_test_app, init_test_app_with, now_unix, post_form, read_body, signed_in_user,
};
use rusqlite::params;

#[test]
fn login_page_loads_successfully() {
    let app = init_test_app();

    let resp = handle(get("/login", None), &app.state).expect("Failed to handle request");
    assert_eq!(resp.status(), 200);

    let body = read_body(resp);
    assert!(body.contains("Iniciar sesión"));
    assert!(body.contains("/auth/request-link"));
}

#[test]
fn request_link_creates_user_and_confirms() {
    let app = init_test_app();

    let req = post_form("/auth/request-link", "email=Test%40Example.com", None);
    let resp = handle(req, &app.state).expect("Failed to handle request");
    assert_eq!(resp.status(), 200);

    let body = read_body(resp);
    assert!(body.contains("Revisa tu correo"));
    assert!(body.contains("test@example.com"));
    assert!(!body.contains("Modo desarrollo"));

    let links: i64 = app
        .state
        .db
        .with_conn(|conn| {
            conn.query_row(
                "select count(*) from magic_links m join users u on u.id = m.user_id where u.email = ?",
                params!["test@example.com"],
                |r| r.get(0),
            )
            .map_err(Into::into)
        })
        .unwrap();
    assert_eq!(links, 1);
}

#[test]
fn request_link_shows_link_in_dev_mode() {
    let app = init_test_app_with(|cfg| cfg.dev_mode = true);

    let req = post_form("/auth/request-link", "email=dev%40example.com", None);
    let body = read_body(handle(req, &app.state).unwrap());
    assert!(body.contains("Modo desarrollo"));
    assert!(body.contains("http://127.0.0.1:8080/auth/magic?token="));
}

#[test]
fn request_link_rejects_invalid_email() {
    let app = init_test_app();

    let resp = respond(post_form("/auth/request-link", "email=nope", None), &app.state);
    assert_eq!(resp.status(), 400);
}

#[test]
fn magic_link_sets_session_cookie_and_redirects() {
    let app = init_test_app();
    let service = MagicLinkService::new(MagicLinkConfig::default());
    let issued = app
        .state
        .db
        .with_conn(|conn| service.request_link(conn, "a@b.com", now_unix()))
        .unwrap();

    let resp = handle(get(&issued.link, None), &app.state).unwrap();
    assert_eq!(resp.status(), 302);
    assert_eq!(resp.headers().get("location").unwrap(), "/favoritos");
    let cookie = resp.headers().get("set-cookie").unwrap().to_str().unwrap();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));

    let token = cookie
        .trim_start_matches("session=")
        .split(';')
        .next()
        .unwrap()
        .to_string();
    let body = read_body(handle(get("/favoritos", Some(&token)), &app.state).unwrap());
    assert!(body.contains("a@b.com"));

    // single use
    let resp = respond(get(&issued.link, None), &app.state);
    assert_eq!(resp.status(), 401);
}

#[test]
fn magic_link_without_token_is_bad_request() {
    let app = init_test_app();

    let resp = respond(get("/auth/magic", None), &app.state);
    assert_eq!(resp.status(), 400);
}

#[test]
fn logout_revokes_session() {
    let app = init_test_app();
    let (_, token) = signed_in_user(&app.state, "out@example.com");

    let resp = handle(post_form("/auth/logout", "", Some(&token)), &app.state).unwrap();
    assert_eq!(resp.status(), 302);
    assert_eq!(resp.headers().get("location").unwrap(), "/");
    let cookie = resp.headers().get("set-cookie").unwrap().to_str().unwrap();
    assert!(cookie.contains("Max-Age=0"));

    let resp = handle(get("/favoritos", Some(&token)), &app.state).unwrap();
    assert_eq!(resp.status(), 302);
    assert_eq!(resp.headers().get("location").unwrap(), "/login");
}
