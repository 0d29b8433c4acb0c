use rusqlite::{params, Connection};

use crate::errors::ServerError;

/// Returns true when the favorite was newly added.
pub fn add_favorite(
    conn: &Connection,
    user_id: i64,
    property_id: &str,
    now: i64,
) -> Result<bool, ServerError> {
    let inserted = conn
        .execute(
            "insert or ignore into favorites (user_id, property_id, created_at) values (?, ?, ?)",
            params![user_id, property_id, now],
        )
        .map_err(|e| ServerError::DbError(format!("insert favorite failed: {e}")))?;
    Ok(inserted == 1)
}

/// Returns true when a favorite was removed.
pub fn remove_favorite(
    conn: &Connection,
    user_id: i64,
    property_id: &str,
) -> Result<bool, ServerError> {
    let deleted = conn
        .execute(
            "delete from favorites where user_id = ? and property_id = ?",
            params![user_id, property_id],
        )
        .map_err(|e| ServerError::DbError(format!("delete favorite failed: {e}")))?;
    Ok(deleted > 0)
}

pub fn is_favorite(conn: &Connection, user_id: i64, property_id: &str) -> Result<bool, ServerError> {
    let n: i64 = conn.query_row(
        "select count(*) from favorites where user_id = ? and property_id = ?",
        params![user_id, property_id],
        |r| r.get(0),
    )?;
    Ok(n > 0)
}

/// Property ids, most recently added first.
pub fn list_favorites(conn: &Connection, user_id: i64) -> Result<Vec<String>, ServerError> {
    let mut stmt = conn
        .prepare(
            "select property_id from favorites
             where user_id = ?
             order by created_at desc, id desc",
        )
        .map_err(|e| ServerError::DbError(format!("prepare favorites failed: {e}")))?;

    let ids = stmt
        .query_map(params![user_id], |r| r.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(ids)
}
