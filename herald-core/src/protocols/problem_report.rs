use std::fmt;

use rst_common::standard::serde_json::Value;

use crate::message::Envelope;

const FIELD_DESCRIPTION: &str = "description";
const FIELD_DESCRIPTION_EN: &str = "en";
const FIELD_CODE: &str = "code";
const FIELD_MESSAGE: &str = "message";

/// `ProblemReport` is the decoded payload of a `problem-report` message
///
/// Agents have sent the description in several shapes over time: a nested
/// `{"en": .., "code": ..}` object, a plain string, or a top level `message`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemReport {
    pub code: Option<String>,
    pub description: String,
}

impl ProblemReport {
    pub fn from_envelope(envelope: &Envelope) -> Self {
        let code = match envelope.get(FIELD_DESCRIPTION) {
            Some(Value::Object(description)) => description
                .get(FIELD_CODE)
                .and_then(Value::as_str)
                .map(String::from),
            _ => None,
        }
        .or_else(|| envelope.get_str(FIELD_CODE).map(String::from));

        let description = match envelope.get(FIELD_DESCRIPTION) {
            Some(Value::Object(description)) => description
                .get(FIELD_DESCRIPTION_EN)
                .and_then(Value::as_str)
                .map(String::from),
            Some(Value::String(description)) => Some(description.clone()),
            _ => None,
        }
        .or_else(|| envelope.get_str(FIELD_MESSAGE).map(String::from))
        .unwrap_or_else(|| "unknown problem".to_string());

        Self { code, description }
    }
}

impl fmt::Display for ProblemReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({})", self.description, code),
            None => write!(f, "{}", self.description),
        }
    }
}

/// Failure text for messages a family does not expect
pub(crate) fn unexpected(message_name: &str, reason: &str) -> String {
    format!("unexpected message {}: {}", message_name, reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rst_common::standard::serde_json::json;
    use table_test::table_test;

    fn envelope(value: Value) -> Envelope {
        Envelope::from_value(value).unwrap()
    }

    #[test]
    fn test_description_shapes() {
        let table = vec![
            (
                json!({"description": {"en": "schema exists", "code": "gen-1"}}),
                ProblemReport {
                    code: Some("gen-1".to_string()),
                    description: "schema exists".to_string(),
                },
            ),
            (
                json!({"description": "bad ledger"}),
                ProblemReport {
                    code: None,
                    description: "bad ledger".to_string(),
                },
            ),
            (
                json!({"message": "not provisioned", "code": "404"}),
                ProblemReport {
                    code: Some("404".to_string()),
                    description: "not provisioned".to_string(),
                },
            ),
            (
                json!({}),
                ProblemReport {
                    code: None,
                    description: "unknown problem".to_string(),
                },
            ),
        ];

        for (validator, input, expected) in table_test!(table) {
            let actual = ProblemReport::from_envelope(&envelope(input.clone()));

            validator
                .given(&format!("{}", input))
                .when("decoding the problem report")
                .then(&format!("{:?}", expected))
                .assert_eq(expected, actual);
        }
    }

    #[test]
    fn test_display() {
        let report = ProblemReport {
            code: Some("gen-1".to_string()),
            description: "schema exists".to_string(),
        };
        assert_eq!(report.to_string(), "schema exists (gen-1)");
    }
}
