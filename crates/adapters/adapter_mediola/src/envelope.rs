//! Hub response envelope and vendor code tables.
//!
//! The hub answers every request with an 8-byte status marker (`{XC_SUC}`
//! or `{XC_ERR}`) followed by a JSON document. State queries carry the
//! blind's condition in a `state` field holding a four-digit hex code:
//!
//! | Code | State |
//! |------|-------|
//! | `A201` | opened |
//! | `A202` | closed |
//! | `A20A` | opening |
//! | `A20B` | closing |
//! | `A20D` | stopped |
//!
//! Any other code is reported as unknown.

use serde_json::Value;

use mediola2mqtt_domain::command::BlindCommand;
use mediola2mqtt_domain::state::BlindState;

/// Length of the status marker preceding the JSON payload.
const STATUS_PREFIX_LEN: usize = 8;

/// Extract the `state` code from a raw hub response.
///
/// Returns `None` when the body is only a status marker, the payload is not
/// JSON, or no string `state` field is present. The hub produces such answers
/// transiently, so callers are expected to ask again.
#[must_use]
pub fn state_code(body: &str) -> Option<String> {
    let payload = body.get(STATUS_PREFIX_LEN..)?;
    let value: Value = serde_json::from_str(payload.trim()).ok()?;
    let object = match &value {
        Value::Array(items) => items.iter().find(|item| item.get("state").is_some())?,
        other => other,
    };
    object.get("state")?.as_str().map(str::to_string)
}

/// Map a vendor state code to a [`BlindState`]. Unrecognised codes map to
/// [`BlindState::Unknown`].
#[must_use]
pub fn state_from_code(code: &str) -> BlindState {
    match code.to_ascii_uppercase().as_str() {
        "A201" => BlindState::Opened,
        "A202" => BlindState::Closed,
        "A20A" => BlindState::Opening,
        "A20B" => BlindState::Closing,
        "A20D" => BlindState::Stopped,
        _ => BlindState::Unknown,
    }
}

/// Two-digit code appended to the blind address in a `SendSC` request.
#[must_use]
pub fn command_code(command: BlindCommand) -> &'static str {
    match command {
        BlindCommand::Open => "01",
        BlindCommand::Close => "00",
        BlindCommand::Stop => "02",
    }
}
