use crate::contact::ContactOutcome;
use crate::db::contacts::ContactStatus;
use crate::domain::query::ListingCard;
use crate::templates::desktop_layout;
use maud::{html, Markup};

pub fn contact_sent_page(
    card: &ListingCard,
    outcome: &ContactOutcome,
    user: Option<&str>,
) -> Markup {
    desktop_layout(
        "Solicitud recibida",
        user,
        html! {
            main class="container narrow" {
                div class="notice success" {
                    h1 { "¡Gracias!" }
                    p {
                        "Recibimos tu interés en "
                        strong { (card.titulo) }
                        @match outcome.estado {
                            ContactStatus::Enviado => { ". Ya avisamos a un asesor por WhatsApp." }
                            _ => { ". Un asesor te contactará pronto." }
                        }
                    }
                    @if let Some(url) = &outcome.whatsapp_url {
                        p {
                            a href=(url) class="btn whatsapp" target="_blank" rel="noopener" {
                                "Escribir por WhatsApp"
                            }
                        }
                    }
                    p class="muted" { "Folio: " (outcome.id) }
                    p { a href={ "/propiedades/" (card.datos.id) } { "← Volver a la propiedad" } }
                }
            }
        },
    )
}
