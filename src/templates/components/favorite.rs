use maud::{html, Markup};

/// Toggle form for the detail page. Signed-out visitors get a login link instead.
pub fn favorite_button(property_id: &str, signed_in: bool, is_favorite: bool) -> Markup {
    html! {
        @if !signed_in {
            a href="/login" class="btn secondary" { "Inicia sesión para guardar" }
        } @else {
            form method="post" action={ "/propiedades/" (property_id) "/favorito" } class="inline" {
                @if is_favorite {
                    input type="hidden" name="accion" value="quitar";
                    button type="submit" class="btn secondary" { "★ Quitar de favoritos" }
                } @else {
                    input type="hidden" name="accion" value="agregar";
                    button type="submit" class="btn" { "☆ Guardar en favoritos" }
                }
            }
        }
    }
}
