// src/contact.rs
//
// Contact requests: stored first, then relayed to the agency over WhatsApp.

use crate::db::contacts::{insert_contact, set_contact_status, ContactStatus, NewContact};
use crate::domain::query::ListingCard;
use crate::errors::ServerError;
use crate::state::AppState;
use crate::whatsapp::{normalize_phone, wa_me_link};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const MAX_NAME_CHARS: usize = 100;
const MAX_MESSAGE_CHARS: usize = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub propiedad_id: String,
    pub nombre: String,
    pub telefono: String,
    #[serde(default)]
    pub mensaje: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactOutcome {
    pub id: i64,
    pub whatsapp_url: Option<String>,
    pub estado: ContactStatus,
}

pub fn contact_message(
    card: &ListingCard,
    nombre: &str,
    telefono: &str,
    mensaje: Option<&str>,
) -> String {
    let mut text = format!(
        "Hola, me interesa la propiedad \"{}\" (ID {}).",
        card.titulo, card.datos.id
    );
    if let Some(url) = &card.url {
        text.push('\n');
        text.push_str(url);
    }
    text.push_str(&format!("\nNombre: {nombre}\nTeléfono: {telefono}"));
    if let Some(m) = mensaje {
        text.push_str(&format!("\nMensaje: {m}"));
    }
    text
}

pub fn submit_contact(
    state: &AppState,
    user_id: Option<i64>,
    form: &ContactForm,
    now: i64,
) -> Result<ContactOutcome, ServerError> {
    let property_id = form.propiedad_id.trim();
    if property_id.is_empty() {
        return Err(ServerError::BadRequest("falta propiedad_id".into()));
    }
    let card = state.catalog.get(property_id).ok_or(ServerError::NotFound)?;

    let nombre = form.nombre.trim();
    if nombre.is_empty() || nombre.chars().count() > MAX_NAME_CHARS {
        return Err(ServerError::BadRequest("nombre inválido".into()));
    }
    let telefono = normalize_phone(&form.telefono)
        .ok_or_else(|| ServerError::BadRequest("número de teléfono inválido".into()))?;
    let mensaje = form
        .mensaje
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty());
    if mensaje.is_some_and(|m| m.chars().count() > MAX_MESSAGE_CHARS) {
        return Err(ServerError::BadRequest("mensaje demasiado largo".into()));
    }

    let text = contact_message(card, nombre, &telefono, mensaje);
    let agency = state.config.whatsapp.agency_number.as_deref();
    let whatsapp_url = agency.map(|number| wa_me_link(number, &text));

    let id = state.db.with_conn(|conn| {
        insert_contact(
            conn,
            &NewContact {
                property_id,
                user_id,
                nombre,
                telefono: &telefono,
                mensaje,
                whatsapp_url: whatsapp_url.as_deref(),
            },
            now,
        )
    })?;

    let mut estado = ContactStatus::Pendiente;
    if let (Some(client), Some(agency)) = (&state.whatsapp, agency) {
        estado = match client.send_text(agency, &text) {
            Ok(()) => ContactStatus::Enviado,
            Err(e) => {
                warn!(contact_id = id, error = %e, "whatsapp send failed");
                ContactStatus::Fallido
            }
        };
        state
            .db
            .with_conn(|conn| set_contact_status(conn, id, estado))?;
    }

    info!(contact_id = id, property_id, estado = %estado, "contact request stored");

    Ok(ContactOutcome {
        id,
        whatsapp_url,
        estado,
    })
}
