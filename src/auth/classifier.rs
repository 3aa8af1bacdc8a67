//! Request classification.
//!
//! Reduces an inbound proxied request to a [`Descriptor`]: the [`Action`] it performs, the zone
//! it targets and, for record mutations, the record type it writes. Classification is a pure
//! function of the method, path and body and the fixed endpoint table below.
//!
//! | Method & path                          | Action               |
//! |----------------------------------------|----------------------|
//! | `GET /dnszone`                         | `list_zones`         |
//! | `POST /dnszone`                        | `create_zone`        |
//! | `POST /dnszone/checkavailability`      | `check_availability` |
//! | `POST /dnszone/records/scan`           | `trigger_scan`       |
//! | `GET /dnszone/{id}`                    | `get_zone`           |
//! | `POST /dnszone/{id}`                   | `update_zone`        |
//! | `GET /dnszone/{id}/records`            | `list_records`       |
//! | `POST /dnszone/{id}/records`           | `add_record`         |
//! | `GET /dnszone/{id}/records/scan`       | `get_scan_result`    |
//! | `POST /dnszone/{id}/records/{rid}`     | `update_record`      |
//! | `DELETE /dnszone/{id}/records/{rid}`   | `delete_record`      |
//! | `POST /dnszone/{id}/import`            | `import_records`     |
//! | `GET /dnszone/{id}/export`             | `export_records`     |
//! | `POST /dnszone/{id}/dnssec`            | `enable_dnssec`      |
//! | `DELETE /dnszone/{id}/dnssec`          | `disable_dnssec`     |
//! | `GET /dnszone/{id}/statistics`         | `get_statistics`     |
//! | `POST /dnszone/{id}/certificate/issue` | `issue_certificate`  |
//!
//! A single trailing slash is tolerated. Zone and record ids must be positive decimal integers.

use crate::auth::{Action, RecordType};
use crate::token_store::ZoneId;
use axum::http::Method;
use serde::Deserialize;
use serde_json::Value;

/// The canonical form of a proxied request, as seen by the permission evaluator.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Descriptor {
    pub action: Action,
    /// Absent only for account-wide actions (`list_zones`, `create_zone`,
    /// `check_availability`, `trigger_scan`).
    pub zone: Option<ZoneId>,
    /// Present only for `add_record` (always) and `update_record` (when the body names one).
    pub record_type: Option<RecordType>,
}

#[derive(thiserror::Error, Debug)]
pub enum ClassifyError {
    #[error("unrecognized endpoint: {method} {path}")]
    UnrecognizedEndpoint { method: Method, path: String },

    #[error("malformed request body: {0}")]
    MalformedBody(#[source] serde_json::Error),

    #[error("missing record type")]
    MissingRecordType,

    #[error("invalid record type: {0}")]
    InvalidRecordType(String),
}

/// Classify a proxied request.
///
/// # Errors
///
/// Returns [`ClassifyError::UnrecognizedEndpoint`] for any method and path outside the endpoint
/// table. For record mutations, returns [`ClassifyError::MalformedBody`] if the body isn't JSON,
/// [`ClassifyError::InvalidRecordType`] if its `Type` isn't a known record type, and
/// [`ClassifyError::MissingRecordType`] if an `add_record` body has no `Type`.
pub fn classify(method: &Method, path: &str, body: &[u8]) -> Result<Descriptor, ClassifyError> {
    let (action, zone) = segments(path)
        .and_then(|segments| route(method, &segments))
        .ok_or_else(|| ClassifyError::UnrecognizedEndpoint {
            method: method.clone(),
            path: path.to_string(),
        })?;

    let record_type = if action.is_record_mutation() {
        match (action, record_type_from_body(body)?) {
            (Action::AddRecord, None) => return Err(ClassifyError::MissingRecordType),
            (_, record_type) => record_type,
        }
    } else {
        None
    };

    Ok(Descriptor {
        action,
        zone,
        record_type,
    })
}

fn segments(path: &str) -> Option<Vec<&str>> {
    let path = path.strip_prefix('/')?;
    let path = path.strip_suffix('/').unwrap_or(path);
    let segments: Vec<&str> = path.split('/').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }
    Some(segments)
}

fn route(method: &Method, segments: &[&str]) -> Option<(Action, Option<ZoneId>)> {
    let routed = match (method, segments) {
        (&Method::GET, ["dnszone"]) => (Action::ListZones, None),
        (&Method::POST, ["dnszone"]) => (Action::CreateZone, None),
        (&Method::POST, ["dnszone", "checkavailability"]) => (Action::CheckAvailability, None),
        (&Method::POST, ["dnszone", "records", "scan"]) => (Action::TriggerScan, None),
        (_, ["dnszone", zone, rest @ ..]) => {
            let zone: ZoneId = zone.parse().ok()?;
            (zone_route(method, rest)?, Some(zone))
        }
        _ => return None,
    };
    Some(routed)
}

fn zone_route(method: &Method, rest: &[&str]) -> Option<Action> {
    let action = match (method, rest) {
        (&Method::GET, []) => Action::GetZone,
        (&Method::POST, []) => Action::UpdateZone,
        (&Method::GET, ["records"]) => Action::ListRecords,
        (&Method::POST, ["records"]) => Action::AddRecord,
        (&Method::GET, ["records", "scan"]) => Action::GetScanResult,
        (&Method::POST, ["records", record]) if is_record_id(record) => Action::UpdateRecord,
        (&Method::DELETE, ["records", record]) if is_record_id(record) => Action::DeleteRecord,
        (&Method::POST, ["import"]) => Action::ImportRecords,
        (&Method::GET, ["export"]) => Action::ExportRecords,
        (&Method::POST, ["dnssec"]) => Action::EnableDnssec,
        (&Method::DELETE, ["dnssec"]) => Action::DisableDnssec,
        (&Method::GET, ["statistics"]) => Action::GetStatistics,
        (&Method::POST, ["certificate", "issue"]) => Action::IssueCertificate,
        _ => return None,
    };
    Some(action)
}

fn is_record_id(segment: &str) -> bool {
    segment.parse::<ZoneId>().is_ok()
}

fn record_type_from_body(body: &[u8]) -> Result<Option<RecordType>, ClassifyError> {
    let payload: Value = serde_json::from_slice(body).map_err(ClassifyError::MalformedBody)?;
    match payload.get("Type") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => RecordType::deserialize(value)
            .map(Some)
            .map_err(|err| ClassifyError::InvalidRecordType(err.to_string())),
    }
}
