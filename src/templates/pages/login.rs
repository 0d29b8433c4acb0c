use crate::templates::{components::email_cta_form, desktop_layout};
use maud::{html, Markup};

pub fn login_page(user: Option<&str>) -> Markup {
    desktop_layout(
        "Iniciar sesión",
        user,
        html! {
            main class="container narrow" {
                h1 { "Iniciar sesión" }
                @if let Some(email) = user {
                    p class="lead" { "Ya tienes sesión iniciada como " strong { (email) } "." }
                }
                p class="lead" {
                    "Escribe tu correo y te mandamos un enlace para entrar y guardar tus favoritos."
                }

                (email_cta_form())
            }
        },
    )
}
