use at_core::{fallback_id, field_text, is_structured, FieldMap, InboundMessage, TransportError};
use serde_json::{json, Value};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};
use tracing::debug;

/// Fields every incoming-message callback carries.
pub const EXPECTED_FIELDS: &[&str] = &["date", "to", "from", "text"];
/// Fields the gateway may add; accepted but never required.
pub const OPTIONAL_FIELDS: &[&str] = &["id", "linkId", "networkCode"];

pub const TRANSPORT_TYPE: &str = "sms";

/// Build an [`InboundMessage`] from validated callback fields.
///
/// The metadata bag always carries `id`, `linkId` and `networkCode`, with
/// `null` for the ones the callback did not include. Arrays and objects are
/// refused for every callback field.
pub fn build_inbound(
    values: FieldMap,
    transport_name: &str,
    provider: &str,
) -> Result<InboundMessage, TransportError> {
    let optional = |name: &str| {
        if is_structured(&values, name) {
            return Err(TransportError::Invalid(format!(
                "field `{name}` must be a single value"
            )));
        }
        Ok(field_text(&values, name))
    };
    let required = |name: &str| {
        optional(name)?
            .ok_or_else(|| TransportError::Invalid(format!("field `{name}` has no value")))
    };
    let to_addr = required("to")?;
    let from_addr = required("from")?;
    let content = required("text")?;
    let date = required("date")?;

    let transport_metadata = json!({
        "id": optional("id")?,
        "linkId": optional("linkId")?,
        "networkCode": optional("networkCode")?,
    });

    Ok(InboundMessage {
        message_id: fallback_id(),
        to_addr,
        from_addr,
        content,
        timestamp: parse_date(&date),
        transport_name: transport_name.to_string(),
        transport_type: TRANSPORT_TYPE.to_string(),
        provider: provider.to_string(),
        transport_metadata,
        raw: Value::Object(values),
    })
}

/// The gateway sends `YYYY-MM-DD HH:MM:SS` (UTC); RFC 3339 is accepted too.
/// Anything else is stamped with the receive time.
fn parse_date(date: &str) -> OffsetDateTime {
    let plain = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let with_fraction =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]");
    OffsetDateTime::parse(date, &Rfc3339)
        .or_else(|_| PrimitiveDateTime::parse(date, plain).map(PrimitiveDateTime::assume_utc))
        .or_else(|_| {
            PrimitiveDateTime::parse(date, with_fraction).map(PrimitiveDateTime::assume_utc)
        })
        .unwrap_or_else(|_| {
            debug!(date, "unrecognised callback date, using receive time");
            OffsetDateTime::now_utc()
        })
}
