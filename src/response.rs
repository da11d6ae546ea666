//! Standard response envelope: {status, message, data}.

use serde::Serialize;
use serde_json::Value;

pub const SUCCESS: &str = "SUCCESS";
pub const FAIL: &str = "FAIL";

/// Delivery envelope consumed by request-handling code.
#[derive(Serialize, Debug)]
pub struct Message {
    pub status: &'static str,
    pub message: Option<String>,
    pub data: Option<Value>,
}

fn to_data(data: impl Serialize) -> Option<Value> {
    match serde_json::to_value(data) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(error = %e, "envelope payload failed to serialize, sending null data");
            None
        }
    }
}

impl Message {
    pub fn success(data: impl Serialize) -> Self {
        Message {
            status: SUCCESS,
            message: None,
            data: to_data(data),
        }
    }

    pub fn success_message(message: impl Into<String>, data: impl Serialize) -> Self {
        Message {
            status: SUCCESS,
            message: Some(message.into()),
            data: to_data(data),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Message {
            status: FAIL,
            message: Some(message.into()),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_shape() {
        let m = Message::success(serde_json::json!({"id": 1}));
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v["status"], "SUCCESS");
        assert_eq!(v["message"], Value::Null);
        assert_eq!(v["data"]["id"], 1);
    }

    #[test]
    fn unserializable_payload_degrades_to_null_data() {
        struct Broken;
        impl Serialize for Broken {
            fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("not representable"))
            }
        }
        let m = Message::success(Broken);
        assert_eq!(m.status, SUCCESS);
        assert_eq!(m.data, None);
    }

    #[test]
    fn fail_envelope_carries_message() {
        let m = Message::fail("boom");
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v["status"], "FAIL");
        assert_eq!(v["message"], "boom");
        assert_eq!(v["data"], Value::Null);
    }
}
