use maud::{html, Markup};

pub fn contact_form(property_id: &str) -> Markup {
    html! {
        form method="post" action={ "/propiedades/" (property_id) "/contacto" } class="contact-form" {
            h3 { "¿Te interesa? Contáctanos" }
            label for="nombre" { "Nombre" }
            input type="text" id="nombre" name="nombre" maxlength="100" required;

            label for="telefono" { "Teléfono (WhatsApp)" }
            input type="tel" id="telefono" name="telefono" placeholder="777 123 4567" required;

            label for="mensaje" { "Mensaje (opcional)" }
            textarea id="mensaje" name="mensaje" rows="3" maxlength="1000" {}

            button type="submit" class="primary" { "Enviar" }
        }
    }
}
