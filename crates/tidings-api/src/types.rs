//! Notification request types

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tidings_util::{NotificationId, TidingsError};

/// Opaque fields handed through to the display capability untouched
pub type Payload = serde_json::Map<String, Value>;

/// A request to show a notification, possibly in the future and possibly repeating.
///
/// Persisted as one flat JSON object. The scheduling fields use the camelCase
/// names of the host bridge (`atTime`, `repeatInterval`, `alertWhileIdle`);
/// every other field is kept in [`payload`](Self::payload).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub id: NotificationId,

    /// Epoch milliseconds. 0 means "deliver now".
    #[serde(default)]
    pub at_time: i64,

    /// Milliseconds between occurrences. 0 means one-shot.
    #[serde(default)]
    pub repeat_interval: i64,

    /// Must be delivered even while the device is idle
    #[serde(default, deserialize_with = "flag_from_bool_or_int")]
    pub alert_while_idle: bool,

    #[serde(flatten)]
    pub payload: Payload,
}

impl NotificationRequest {
    /// An immediate, one-shot request with an empty payload
    pub fn new(id: impl Into<NotificationId>) -> Self {
        Self {
            id: id.into(),
            at_time: 0,
            repeat_interval: 0,
            alert_while_idle: false,
            payload: Payload::new(),
        }
    }

    pub fn with_at_time(mut self, at_time: i64) -> Self {
        self.at_time = at_time;
        self
    }

    pub fn with_repeat_interval(mut self, interval: i64) -> Self {
        self.repeat_interval = interval;
        self
    }

    pub fn with_alert_while_idle(mut self, alert_while_idle: bool) -> Self {
        self.alert_while_idle = alert_while_idle;
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn is_immediate(&self) -> bool {
        self.at_time == 0
    }

    pub fn is_repeating(&self) -> bool {
        self.repeat_interval > 0
    }

    pub fn title(&self) -> Option<&str> {
        self.payload.get("title").and_then(Value::as_str)
    }

    pub fn body(&self) -> Option<&str> {
        self.payload.get("body").and_then(Value::as_str)
    }

    /// Reject values the engine cannot schedule
    pub fn validate(&self) -> Result<(), TidingsError> {
        if self.at_time < 0 {
            return Err(TidingsError::malformed(
                Some(self.id),
                format!("negative atTime {}", self.at_time),
            ));
        }
        if self.repeat_interval < 0 {
            return Err(TidingsError::malformed(
                Some(self.id),
                format!("negative repeatInterval {}", self.repeat_interval),
            ));
        }
        Ok(())
    }

    /// Parse the persisted JSON form
    pub fn from_json(json: &str) -> Result<Self, TidingsError> {
        let request: Self =
            serde_json::from_str(json).map_err(|e| TidingsError::malformed(None, e.to_string()))?;
        request.validate()?;
        Ok(request)
    }

    pub fn to_json(&self) -> Result<String, TidingsError> {
        serde_json::to_string(self).map_err(|e| TidingsError::malformed(Some(self.id), e.to_string()))
    }
}

/// Accepts `true`/`false` as well as the `1`/`0` integers older hosts persisted
fn flag_from_bool_or_int<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i == 1,
    })
}
