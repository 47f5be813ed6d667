//! HTTP API sources.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::FetchError;
use crate::table::Table;

use super::json;

/// Timeout for API source requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// GET a JSON document and convert it into a table.
///
/// Returns the table and the raw response body.
pub fn fetch_json_table(url: &str, params: &[(String, String)]) -> Result<(Table, Vec<u8>), FetchError> {
    let http_err = |e: reqwest::Error| FetchError::Http {
        url: url.to_string(),
        message: e.to_string(),
    };

    let client = Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(http_err)?;

    let response = client.get(url).query(params).send().map_err(http_err)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.bytes().map_err(http_err)?.to_vec();
    let table = json::table_from_slice(&body)?;
    Ok((table, body))
}
