//! Normalize inbound requests into canonical internal models.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::EngineError;
use crate::types::*;

/// Lowercase, trim, and collapse whitespace runs to a single space.
pub fn clean_text(text: &str) -> String {
  text
    .split_whitespace()
    .map(|w| w.to_lowercase())
    .collect::<Vec<_>>()
    .join(" ")
}

/// Parse an ISO-8601 timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, EngineError> {
  let s = raw.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Ok(dt.with_timezone(&Utc));
  }
  if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M%:z") {
    return Ok(dt.with_timezone(&Utc));
  }
  for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
      return Ok(naive.and_utc());
    }
  }
  if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
    if let Some(naive) = date.and_hms_opt(0, 0, 0) {
      return Ok(naive.and_utc());
    }
  }
  Err(EngineError::validation(
    field,
    &format!("invalid ISO-8601 timestamp: {:?}", raw),
  ))
}

fn geo_point(field: &str, lat: f64, lon: f64) -> Result<GeoPoint, EngineError> {
  if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
    return Err(EngineError::validation(
      &format!("{}.lat", field),
      "must be within [-90, 90]",
    ));
  }
  if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
    return Err(EngineError::validation(
      &format!("{}.lon", field),
      "must be within [-180, 180]",
    ));
  }
  Ok(GeoPoint::new(lat, lon))
}

/// Resolve the single location mode of a text report. A non-blank area id wins and is
/// kept verbatim; area ids only ever compare by exact equality.
fn resolve_location(raw: &InboundTextReport) -> Result<Location, EngineError> {
  if let Some(area) = raw.area_id.as_deref().filter(|a| !a.trim().is_empty()) {
    return Ok(Location::Area(area.to_string()));
  }
  match (raw.latitude, raw.longitude) {
    (Some(lat), Some(lon)) => Ok(Location::Point(geo_point("location", lat, lon)?)),
    _ => Err(EngineError::validation(
      "location",
      "either area_id or both latitude and longitude must be provided",
    )),
  }
}

/// Validate a text report and build the record it will become in history.
pub fn normalize_text_report(raw: &InboundTextReport) -> Result<IncidentRecord, EngineError> {
  let location = resolve_location(raw)?;
  let timestamp = parse_timestamp("timestamp", &raw.timestamp)?;
  let text = clean_text(&raw.text);
  if text.is_empty() {
    return Err(EngineError::validation("text", "must not be empty"));
  }

  Ok(IncidentRecord {
    text,
    timestamp,
    location,
  })
}

/// Validate an image dedup request.
pub fn normalize_image_request(raw: &InboundImageRequest) -> Result<ImageBatch, EngineError> {
  let new = &raw.new_image;
  if new.image_ref.trim().is_empty() {
    return Err(EngineError::validation("new_image.image_ref", "must not be empty"));
  }
  let new_image = ImageReport {
    image_ref: new.image_ref.trim().to_string(),
    location: geo_point("new_image", new.lat, new.lon)?,
    timestamp: parse_timestamp("new_image.timestamp", &new.timestamp)?,
  };

  let candidates = raw
    .candidate_images
    .iter()
    .map(|c| {
      Ok(CandidateImage {
        image_ref: c.image_ref.trim().to_string(),
        incident_id: c.incident_id.clone(),
        image_id: c.image_id.clone(),
        location: geo_point("candidate_images[]", c.lat, c.lon)?,
        timestamp: parse_timestamp("candidate_images[].timestamp", &c.timestamp)?,
      })
    })
    .collect::<Result<Vec<_>, EngineError>>()?;

  Ok(ImageBatch {
    new_image,
    candidates,
  })
}

/// Fold the legacy `duplicates` alias into `report_count` and floor it at 1.
/// A negative age (caller clock skew) is treated as just reported.
///
/// Works on a copy; the caller's request is untouched.
pub fn normalize_priority_request(raw: &PriorityRequest) -> Result<PriorityInput, EngineError> {
  if raw.incident_id.trim().is_empty() {
    return Err(EngineError::validation("incident_id", "must not be empty"));
  }

  let report_count = raw.report_count.or(raw.duplicates).unwrap_or(1).max(1);
  let report_count = u32::try_from(report_count).unwrap_or(u32::MAX);

  Ok(PriorityInput {
    incident_id: raw.incident_id.clone(),
    incident_type: raw.incident_type.trim().to_string(),
    description: raw.description.trim().to_string(),
    report_count,
    image_attached: raw.image_attached,
    time_since_report_minutes: raw.time_since_report_minutes.max(0),
  })
}
