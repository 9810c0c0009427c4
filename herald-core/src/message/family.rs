use super::envelope::Envelope;
use super::types::{
    MessageError, Qualifier, MSG_PROBLEM_REPORT, MSG_STATUS_REPORT, TYPE_DELIMITER,
};

/// `MessageFamily` identifies a protocol namespace
///
/// The `(qualifier, family, version)` triple fully determines every message type string the
/// family renders, which is what lets the receiving side map an inbound `@type` back to its
/// family through [`MessageType::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageFamily {
    qualifier: Qualifier,
    family: String,
    version: String,
}

impl MessageFamily {
    pub fn new(qualifier: Qualifier, family: &str, version: &str) -> Result<Self, MessageError> {
        validate_segment("family", family)?;
        validate_segment("version", version)?;

        if qualifier.as_str().is_empty() || qualifier.as_str().contains(TYPE_DELIMITER) {
            return Err(MessageError::InvalidFamily(format!(
                "invalid qualifier: {}",
                qualifier
            )));
        }

        Ok(Self {
            qualifier,
            family: family.to_string(),
            version: version.to_string(),
        })
    }

    /// Family built from constants that are already known to be valid
    pub(crate) fn known(qualifier: Qualifier, family: &str, version: &str) -> Self {
        Self {
            qualifier,
            family: family.to_string(),
            version: version.to_string(),
        }
    }

    pub fn qualifier(&self) -> &Qualifier {
        &self.qualifier
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Render the type string of a message name that is known to be valid
    ///
    /// Names coming from outside go through [`MessageFamily::try_type_string`].
    pub fn type_string(&self, message_name: &str) -> String {
        debug_assert!(
            validate_segment("message name", message_name).is_ok(),
            "invalid message name: {:?}",
            message_name
        );

        format!(
            "{}{}{}/{}/{}",
            self.qualifier, TYPE_DELIMITER, self.family, self.version, message_name
        )
    }

    /// Render the type string, rejecting names that [`MessageType::parse`] could not read back
    pub fn try_type_string(&self, message_name: &str) -> Result<String, MessageError> {
        validate_segment("message name", message_name)?;
        Ok(self.type_string(message_name))
    }

    pub fn status_type_string(&self) -> String {
        self.type_string(MSG_STATUS_REPORT)
    }

    pub fn problem_report_type_string(&self) -> String {
        self.type_string(MSG_PROBLEM_REPORT)
    }

    /// Build the `{"@type", "@id"}` skeleton, the `@id` is freshly generated on each call
    pub fn build_envelope(&self, message_name: &str) -> Envelope {
        Envelope::new(self.type_string(message_name))
    }

    pub fn matches(&self, msg_type: &MessageType) -> bool {
        self.family == msg_type.family && self.version == msg_type.version
    }
}

fn validate_segment(label: &str, value: &str) -> Result<(), MessageError> {
    if value.trim().is_empty() {
        return Err(MessageError::InvalidFamily(format!("{} is empty", label)));
    }

    if value.contains('/') {
        return Err(MessageError::InvalidFamily(format!(
            "{} must not contain '/': {}",
            label, value
        )));
    }

    Ok(())
}

/// `MessageType` is a parsed message type string: `<qualifier>;spec/<family>/<version>/<name>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageType {
    qualifier: Qualifier,
    family: String,
    version: String,
    name: String,
}

impl MessageType {
    pub fn parse(raw: &str) -> Result<Self, MessageError> {
        let (qualifier, path) = raw
            .split_once(TYPE_DELIMITER)
            .ok_or_else(|| MessageError::MalformedType(format!("missing delimiter: {}", raw)))?;

        if qualifier.is_empty() {
            return Err(MessageError::MalformedType(format!(
                "missing qualifier: {}",
                raw
            )));
        }

        let segments: Vec<&str> = path.split('/').collect();
        match segments.as_slice() {
            [family, version, name]
                if !family.is_empty() && !version.is_empty() && !name.is_empty() =>
            {
                Ok(Self {
                    qualifier: Qualifier::from(qualifier),
                    family: family.to_string(),
                    version: version.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(MessageError::MalformedType(format!(
                "expected family/version/name: {}",
                raw
            ))),
        }
    }

    pub fn qualifier(&self) -> &Qualifier {
        &self.qualifier
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_status_report(&self) -> bool {
        self.name == MSG_STATUS_REPORT
    }

    pub fn is_problem_report(&self) -> bool {
        self.name == MSG_PROBLEM_REPORT
    }
}

impl TryFrom<&str> for MessageType {
    type Error = MessageError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        MessageType::parse(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use table_test::table_test;

    use crate::message::types::{AGENCY_QUALIFIER, COMMUNITY_QUALIFIER};

    #[test]
    fn test_type_string_format() {
        let family = MessageFamily::new(Qualifier::Agency, "write-schema", "0.6").unwrap();
        assert_eq!(
            family.type_string("write"),
            format!("{};spec/write-schema/0.6/write", AGENCY_QUALIFIER)
        );
        assert_eq!(
            family.status_type_string(),
            format!("{};spec/write-schema/0.6/status-report", AGENCY_QUALIFIER)
        );
        assert_eq!(
            family.problem_report_type_string(),
            format!("{};spec/write-schema/0.6/problem-report", AGENCY_QUALIFIER)
        );
    }

    #[test]
    fn test_equal_triples_render_same_strings() {
        let first = MessageFamily::new(Qualifier::Community, "relationship", "1.0").unwrap();
        let second = MessageFamily::new(
            Qualifier::from(COMMUNITY_QUALIFIER),
            "relationship",
            "1.0",
        )
        .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.type_string("create"), second.type_string("create"));
        assert_eq!(first.status_type_string(), second.status_type_string());
    }

    #[test]
    fn test_parse_recovers_components() {
        let table = vec![
            (
                (Qualifier::Agency, "write-schema", "0.6", "write"),
                (AGENCY_QUALIFIER, "write-schema", "0.6", "write"),
            ),
            (
                (Qualifier::Agency, "issuer-setup", "0.6", "public-identifier-created"),
                (AGENCY_QUALIFIER, "issuer-setup", "0.6", "public-identifier-created"),
            ),
            (
                (Qualifier::Community, "relationship", "1.0", "create"),
                (COMMUNITY_QUALIFIER, "relationship", "1.0", "create"),
            ),
            (
                (Qualifier::Agency, "connecting", "0.6", "CONN_REQUEST_RESP"),
                (AGENCY_QUALIFIER, "connecting", "0.6", "CONN_REQUEST_RESP"),
            ),
            (
                (Qualifier::Custom("did:example:abc".to_string()), "custom", "2.1", "ping"),
                ("did:example:abc", "custom", "2.1", "ping"),
            ),
        ];

        for (validator, input, expected) in table_test!(table) {
            let (qualifier, family, version, name) = input;
            let msg_family = MessageFamily::new(qualifier, family, version).unwrap();
            let parsed = MessageType::parse(&msg_family.type_string(name)).unwrap();

            validator
                .given(&format!("{:?}", expected))
                .when("parse rendered type string")
                .then("recover the original components")
                .assert_eq(
                    expected,
                    (
                        parsed.qualifier().as_str(),
                        parsed.family(),
                        parsed.version(),
                        parsed.name(),
                    ),
                );

            assert!(msg_family.matches(&parsed));
        }
    }

    #[test]
    fn test_parse_malformed() {
        let table = vec![
            ("", true),
            ("write-schema/0.6/write", true),
            (";spec/write-schema/0.6/write", true),
            ("did:sov:123;spec/write-schema/0.6", true),
            ("did:sov:123;spec/write-schema/0.6/write/extra", true),
            ("did:sov:123;spec/write-schema//write", true),
            ("did:sov:123;spec/write-schema/0.6/write", false),
        ];

        for (validator, input, expected) in table_test!(table) {
            let parsed = MessageType::parse(input);

            validator
                .given(input)
                .when("parse")
                .then("rejects malformed type strings")
                .assert_eq(expected, parsed.is_err());

            if let Err(err) = parsed {
                assert!(matches!(err, MessageError::MalformedType(_)));
            }
        }
    }

    #[test]
    fn test_try_type_string() {
        let family = MessageFamily::new(Qualifier::Agency, "write-schema", "0.6").unwrap();
        let table = vec![("write", true), ("", false), ("  ", false), ("a/b", false)];

        for (validator, input, expected) in table_test!(table) {
            let rendered = family.try_type_string(input);

            validator
                .given(&format!("{:?}", input))
                .when("render type string")
                .then("only names that parse back are rendered")
                .assert_eq(expected, rendered.is_ok());

            match rendered {
                Ok(raw) => assert_eq!(MessageType::parse(&raw).unwrap().name(), input),
                Err(err) => assert!(matches!(err, MessageError::InvalidFamily(_))),
            }
        }
    }

    #[test]
    #[should_panic(expected = "invalid message name")]
    fn test_type_string_rejects_empty_name() {
        let family = MessageFamily::new(Qualifier::Agency, "write-schema", "0.6").unwrap();
        family.type_string("");
    }

    #[test]
    fn test_new_invalid_family() {
        let empty_family = MessageFamily::new(Qualifier::Agency, "", "0.6");
        assert!(matches!(
            empty_family.unwrap_err(),
            MessageError::InvalidFamily(_)
        ));

        let empty_version = MessageFamily::new(Qualifier::Agency, "write-schema", " ");
        assert!(matches!(
            empty_version.unwrap_err(),
            MessageError::InvalidFamily(_)
        ));

        let nested = MessageFamily::new(Qualifier::Agency, "write/schema", "0.6");
        assert!(nested.is_err());

        let empty_qualifier = MessageFamily::new(Qualifier::Custom(String::new()), "a", "1.0");
        assert!(empty_qualifier.is_err());
    }

    #[test]
    fn test_build_envelope_fresh_id() {
        let family = MessageFamily::new(Qualifier::Agency, "write-schema", "0.6").unwrap();
        let first = family.build_envelope("write");
        let second = family.build_envelope("write");

        assert_eq!(first.msg_type(), Some(family.type_string("write").as_str()));
        assert!(first.id().is_some());
        assert_ne!(first.id(), second.id());
    }
}
