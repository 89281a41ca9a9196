use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Spreadsheet header row, in persisted column order.
pub const LEAD_COLUMNS: [&str; 9] = [
    "received_at",
    "name",
    "phone",
    "email",
    "city",
    "type",
    "monthly_bill",
    "estimated_kw",
    "notes",
];

// ============ Lead ============

/// A prospective customer's solar inquiry.
///
/// Every field is free text and always present; fields missing from a submission are
/// stored as empty strings. Field order matches [`LEAD_COLUMNS`] and is preserved in the
/// JSON rendering used for the notification email.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    /// Server-assigned UTC timestamp.
    pub received_at: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub city: String,
    /// Residential/commercial classification.
    #[serde(rename = "type")]
    pub lead_type: String,
    pub monthly_bill: String,
    pub estimated_kw: String,
    pub notes: String,
}

impl Lead {
    /// Builds a lead from a submitted JSON object.
    ///
    /// `received_at` always comes from the server; a client-supplied value is ignored.
    pub fn from_submission(payload: &Map<String, Value>, received_at: String) -> Self {
        let field = |key: &str| payload.get(key).map(field_text).unwrap_or_default();

        Self {
            received_at,
            name: field("name"),
            phone: field("phone"),
            email: field("email"),
            city: field("city"),
            lead_type: field("type"),
            monthly_bill: field("monthly_bill"),
            estimated_kw: field("estimated_kw"),
            notes: field("notes"),
        }
    }

    /// Rebuilds a lead from a spreadsheet row. Missing trailing cells become empty.
    pub fn from_row(cells: &[String]) -> Self {
        let cell = |index: usize| cells.get(index).cloned().unwrap_or_default();

        Self {
            received_at: cell(0),
            name: cell(1),
            phone: cell(2),
            email: cell(3),
            city: cell(4),
            lead_type: cell(5),
            monthly_bill: cell(6),
            estimated_kw: cell(7),
            notes: cell(8),
        }
    }

    /// Field values in [`LEAD_COLUMNS`] order.
    pub fn row(&self) -> [&str; 9] {
        [
            &self.received_at,
            &self.name,
            &self.phone,
            &self.email,
            &self.city,
            &self.lead_type,
            &self.monthly_bill,
            &self.estimated_kw,
            &self.notes,
        ]
    }

    pub fn email_subject(&self) -> String {
        format!("New Solar Lead: {} ({})", self.name, self.city)
    }

    /// Indented JSON rendering used as the notification body.
    ///
    /// The body is pure ASCII: anything outside it is written as `\uXXXX` escapes, with
    /// UTF-16 surrogate pairs above the BMP.
    pub fn email_body(&self) -> Result<String, serde_json::Error> {
        let pretty = serde_json::to_string_pretty(self)?;
        Ok(escape_non_ascii(&pretty))
    }
}

// serde_json only emits non-ASCII inside string literals, so escaping it is always valid JSON
fn escape_non_ascii(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut units = [0u16; 2];
    for ch in json.chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else {
            for unit in ch.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}

/// Renders a submitted JSON value as lead text.
///
/// Strings are taken verbatim, `null` becomes empty, anything else keeps its JSON text.
fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Formats a submission time the way leads are stamped: ISO-8601, UTC, no offset suffix.
pub fn lead_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

// ============ API Response Models ============

/// Response for `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Response for `POST /chat`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Response for `POST /lead`.
#[derive(Debug, Serialize, Deserialize)]
pub struct LeadAccepted {
    pub status: String,
    /// Whether the notification email went out.
    pub email_sent: bool,
    pub lead: Lead,
}
