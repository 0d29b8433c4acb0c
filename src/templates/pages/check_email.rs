use crate::templates::desktop_layout;
use maud::{html, Markup};

/// Confirmation after requesting a link. `dev_link` is only passed in development.
pub fn check_email_page(email: &str, dev_link: Option<&str>) -> Markup {
    desktop_layout(
        "Revisa tu correo",
        None,
        html! {
            main class="container narrow" {
                div class="notice success" {
                    h1 { "Revisa tu correo" }
                    p {
                        "Enviamos un enlace de acceso a "
                        strong { (email) }
                        ". Vence en 15 minutos y solo funciona una vez."
                    }
                    @if let Some(link) = dev_link {
                        p class="dev-link" {
                            "Modo desarrollo: "
                            a href=(link) { "entrar ahora" }
                        }
                    }
                    p { a href="/login" { "Usar otro correo" } }
                }
            }
        },
    )
}
