use crate::errors::ServerError;
use astra::Response;

pub mod assets;
pub mod errors;
pub mod html;
pub mod json;

pub type ResultResp = Result<Response, ServerError>;

pub use assets::static_asset;
pub use errors::{html_error_response, json_error_response};
pub use html::{html_response, html_response_status, redirect};
pub use json::json_response;
