use crate::domain::listing::Amenidades;
use crate::domain::query::ListingCard;
use crate::templates::components::{contact_form, favorite_button, format_price};
use crate::templates::desktop_layout;
use maud::{html, Markup};

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Sí"
    } else {
        "No"
    }
}

pub fn property_page(card: &ListingCard, user: Option<&str>, is_favorite: bool) -> Markup {
    let d = &card.datos;
    let amenidades: Vec<&str> = Amenidades::NAMES
        .iter()
        .copied()
        .filter(|name| d.amenidades.get(name).unwrap_or(false))
        .collect();
    let ubicacion: Vec<&str> = [d.colonia.as_deref(), d.ciudad.as_deref(), d.estado.as_deref()]
        .into_iter()
        .flatten()
        .collect();

    desktop_layout(
        &card.titulo,
        user,
        html! {
            main class="container property" {
                a href="/" class="back" { "← Volver al catálogo" }
                h1 { (card.titulo) }
                p class="price" { (format_price(d.precio)) }
                @if !ubicacion.is_empty() {
                    p class="location" { (ubicacion.join(", ")) }
                }

                @if let Some(img) = &card.imagen_portada {
                    img class="cover" src=(img) alt=(card.titulo);
                }

                (favorite_button(&d.id, user.is_some(), is_favorite))

                section class="details" {
                    h2 { "Características" }
                    dl {
                        @if let Some(t) = d.tipo_propiedad { dt { "Tipo" } dd { (t) } }
                        @if let Some(o) = d.tipo_operacion { dt { "Operación" } dd { (o) } }
                        @if let Some(n) = d.recamaras { dt { "Recámaras" } dd { (n) } }
                        @if let Some(n) = d.banos { dt { "Baños" } dd { (n) } }
                        @if let Some(n) = d.medio_bano { dt { "Medios baños" } dd { (n) } }
                        @if let Some(n) = d.niveles { dt { "Niveles" } dd { (n) } }
                        @if let Some(n) = d.estacionamientos { dt { "Estacionamientos" } dd { (n) } }
                        @if let Some(m) = d.superficie_m2 { dt { "Terreno" } dd { (m) " m²" } }
                        @if let Some(m) = d.construccion_m2 { dt { "Construcción" } dd { (m) " m²" } }
                        @if let Some(flag) = d.es_un_nivel { dt { "Un solo nivel" } dd { (yes_no(flag)) } }
                    }
                    @if !amenidades.is_empty() {
                        h3 { "Amenidades" }
                        ul class="tags" {
                            @for a in &amenidades { li { (a.replace('_', " ")) } }
                        }
                    }
                    h3 { "Documentación y pago" }
                    ul class="tags" {
                        @if d.legal.escrituras { li { "Escrituras" } }
                        @if d.legal.cesion_derechos { li { "Cesión de derechos" } }
                        @if d.legal.credito { li { "Acepta crédito" } }
                        @if d.legal.contado { li { "Contado" } }
                    }
                }

                @if !card.descripcion.is_empty() {
                    section class="description" {
                        h2 { "Descripción" }
                        @for line in card.descripcion.lines() {
                            p { (line) }
                        }
                    }
                }

                @if let Some(url) = &card.url {
                    p { a href=(url) rel="noopener" target="_blank" { "Ver publicación original" } }
                }

                (contact_form(&d.id))
            }
        },
    )
}
