use crate::domain::query::ListingCard;
use maud::{html, Markup};

pub mod contact_form;
pub mod email_cta;
pub mod error;
pub mod favorite;

pub use contact_form::contact_form;
pub use email_cta::email_cta_form;
pub use error::error_page;
pub use favorite::favorite_button;

/// "$1,200,000 MXN", or "Precio a consultar" when the listing has no price.
pub fn format_price(precio: Option<f64>) -> String {
    let Some(p) = precio else {
        return "Precio a consultar".to_string();
    };
    let digits = format!("{:.0}", p.round());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("${grouped} MXN")
}

pub fn listing_card(card: &ListingCard) -> Markup {
    let d = &card.datos;
    html! {
        article class="card listing" {
            @if let Some(img) = &card.imagen_portada {
                img src=(img) alt=(card.titulo) loading="lazy";
            }
            div class="card-body" {
                h2 { a href={ "/propiedades/" (d.id) } { (card.titulo) } }
                p class="price" { (format_price(d.precio)) }
                p class="meta" {
                    @if let Some(t) = d.tipo_propiedad { span { (t) } }
                    @if let Some(o) = d.tipo_operacion { span { (o) } }
                    @if let Some(c) = &d.ciudad { span { (c) } }
                }
                ul class="features" {
                    @if let Some(n) = d.recamaras { li { (n) " rec." } }
                    @if let Some(n) = d.banos { li { (n) " baños" } }
                    @if let Some(m) = d.construccion_m2.or(d.superficie_m2) { li { (m) " m²" } }
                }
            }
        }
    }
}
