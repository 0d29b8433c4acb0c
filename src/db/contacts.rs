use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::fmt;

use crate::errors::ServerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    Pendiente,
    Enviado,
    Fallido,
}

impl ContactStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ContactStatus::Pendiente => "pendiente",
            ContactStatus::Enviado => "enviado",
            ContactStatus::Fallido => "fallido",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "pendiente" => Some(ContactStatus::Pendiente),
            "enviado" => Some(ContactStatus::Enviado),
            "fallido" => Some(ContactStatus::Fallido),
            _ => None,
        }
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct NewContact<'a> {
    pub property_id: &'a str,
    pub user_id: Option<i64>,
    pub nombre: &'a str,
    pub telefono: &'a str,
    pub mensaje: Option<&'a str>,
    pub whatsapp_url: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRow {
    pub id: i64,
    pub property_id: String,
    pub user_id: Option<i64>,
    pub nombre: String,
    pub telefono: String,
    pub mensaje: Option<String>,
    pub whatsapp_url: Option<String>,
    pub estado: ContactStatus,
    pub created_at: i64,
}

pub fn insert_contact(conn: &Connection, c: &NewContact<'_>, now: i64) -> Result<i64, ServerError> {
    conn.execute(
        "insert into contacts (property_id, user_id, nombre, telefono, mensaje, whatsapp_url, estado, created_at)
         values (?, ?, ?, ?, ?, ?, 'pendiente', ?)",
        params![
            c.property_id,
            c.user_id,
            c.nombre,
            c.telefono,
            c.mensaje,
            c.whatsapp_url,
            now
        ],
    )
    .map_err(|e| ServerError::DbError(format!("insert contact failed: {e}")))?;
    Ok(conn.last_insert_rowid())
}

pub fn set_contact_status(
    conn: &Connection,
    id: i64,
    estado: ContactStatus,
) -> Result<(), ServerError> {
    conn.execute(
        "update contacts set estado = ? where id = ?",
        params![estado.as_str(), id],
    )
    .map_err(|e| ServerError::DbError(format!("update contact status failed: {e}")))?;
    Ok(())
}

pub fn get_contact(conn: &Connection, id: i64) -> Result<Option<ContactRow>, ServerError> {
    let row = conn
        .query_row(
            "select id, property_id, user_id, nombre, telefono, mensaje, whatsapp_url, estado, created_at
             from contacts where id = ?",
            params![id],
            |r| {
                let estado: String = r.get(7)?;
                Ok(ContactRow {
                    id: r.get(0)?,
                    property_id: r.get(1)?,
                    user_id: r.get(2)?,
                    nombre: r.get(3)?,
                    telefono: r.get(4)?,
                    mensaje: r.get(5)?,
                    whatsapp_url: r.get(6)?,
                    estado: ContactStatus::parse(&estado).unwrap_or(ContactStatus::Pendiente),
                    created_at: r.get(8)?,
                })
            },
        )
        .optional()
        .map_err(|e| ServerError::DbError(format!("select contact failed: {e}")))?;
    Ok(row)
}
