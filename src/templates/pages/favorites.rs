use crate::domain::query::ListingCard;
use crate::templates::{desktop_layout, listing_card};
use maud::{html, Markup};

/// `missing` counts saved ids that are no longer in the catalog.
pub fn favorites_page(user: &str, cards: &[&ListingCard], missing: usize) -> Markup {
    desktop_layout(
        "Favoritos",
        Some(user),
        html! {
            main class="container" {
                h1 { "Mis favoritos" }
                @if cards.is_empty() {
                    p class="muted" {
                        "Aún no guardas propiedades. "
                        a href="/" { "Explora el catálogo" }
                    }
                } @else {
                    div class="grid" {
                        @for card in cards {
                            (listing_card(card))
                        }
                    }
                }
                @if missing > 0 {
                    p class="muted" { (missing) " favorito(s) ya no están publicados." }
                }
            }
        },
    )
}
