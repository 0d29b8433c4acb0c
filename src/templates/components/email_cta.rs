use maud::{html, Markup};

pub fn email_cta_form() -> Markup {
    html! {
        div class="email-cta-wrapper" {
            form
                method="post"
                action="/auth/request-link"
                class="email-cta"
            {
                label class="sr-only" for="email" { "Correo electrónico" }
                input
                    type="email"
                    id="email"
                    name="email"
                    placeholder="tu@correo.com"
                    autocomplete="email"
                    required;

                button type="submit" class="primary" { "Enviar enlace" }

                p class="microcopy" {
                    "Te enviaremos un enlace seguro para entrar. Sin contraseñas."
                }
            }
        }
    }
}
