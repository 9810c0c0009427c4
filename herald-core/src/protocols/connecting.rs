use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{self, Value};

use crate::correlation::types::CorrelationError;
use crate::correlation::Exchange;
use crate::crypto::types::CryptoBuilder;
use crate::message::types::{MessageError, Qualifier, ThreadID, MSG_PROBLEM_REPORT};
use crate::message::{Envelope, MessageFamily};
use crate::protocol::types::{FamilyMessage, ProtocolError};
use crate::protocol::Protocol;
use crate::session::Session;
use crate::transport::types::TransportBuilder;

use super::problem_report::{unexpected, ProblemReport};

pub const FAMILY: &str = "connecting";
pub const VERSION: &str = "0.6";

pub const MSG_CREATE_CONNECTION: &str = "CREATE_CONNECTION";
pub const MSG_CONN_REQUEST_RESP: &str = "CONN_REQUEST_RESP";
pub const MSG_CONN_REQ_ACCEPTED: &str = "CONN_REQ_ACCEPTED";

const FIELD_SOURCE_ID: &str = "sourceId";
const FIELD_INCLUDE_PUBLIC_DID: &str = "includePublicDID";
const FIELD_INVITE_DETAIL: &str = "inviteDetail";
const FIELD_SENDER_DETAIL: &str = "senderDetail";
const FIELD_SENDER_DID: &str = "DID";

#[derive(Debug, Deserialize)]
#[serde(crate = "self::serde", rename_all = "camelCase")]
struct InviteDetail {
    conn_req_id: String,
    status_code: String,
    status_msg: String,
    target_name: String,
    version: String,
    thread_id: Option<String>,
    sender_detail: SenderDetail,
    sender_agency_detail: SenderAgencyDetail,
}

#[derive(Debug, Deserialize)]
#[serde(crate = "self::serde", rename_all = "camelCase")]
struct SenderDetail {
    name: String,

    #[serde(rename = "DID")]
    did: String,

    logo_url: String,
    ver_key: String,

    #[serde(rename = "publicDID")]
    public_did: Option<String>,

    agent_key_dlg_proof: DelegationProof,
}

#[derive(Debug, Deserialize)]
#[serde(crate = "self::serde", rename_all = "camelCase")]
struct DelegationProof {
    #[serde(rename = "agentDID")]
    agent_did: String,

    agent_delegated_key: String,
    signature: String,
}

#[derive(Debug, Deserialize)]
#[serde(crate = "self::serde", rename_all = "camelCase")]
struct SenderAgencyDetail {
    #[serde(rename = "DID")]
    did: String,

    endpoint: String,
    ver_key: String,
}

#[derive(Debug, Serialize)]
#[serde(crate = "self::serde")]
struct TruncatedInviteDetail {
    id: String,
    sc: String,
    sm: String,
    t: String,
    version: String,

    #[serde(rename = "threadId", skip_serializing_if = "Option::is_none")]
    thread_id: Option<String>,

    s: TruncatedSender,
    sa: TruncatedAgency,
}

#[derive(Debug, Serialize)]
#[serde(crate = "self::serde")]
struct TruncatedSender {
    #[serde(rename = "publicDID", skip_serializing_if = "Option::is_none")]
    public_did: Option<String>,

    n: String,
    d: String,
    l: String,
    v: String,
    dp: TruncatedProof,
}

#[derive(Debug, Serialize)]
#[serde(crate = "self::serde")]
struct TruncatedProof {
    d: String,
    k: String,
    s: String,
}

#[derive(Debug, Serialize)]
#[serde(crate = "self::serde")]
struct TruncatedAgency {
    d: String,
    e: String,
    v: String,
}

impl From<InviteDetail> for TruncatedInviteDetail {
    fn from(detail: InviteDetail) -> Self {
        let sender = detail.sender_detail;
        let agency = detail.sender_agency_detail;

        Self {
            id: detail.conn_req_id,
            sc: detail.status_code,
            sm: detail.status_msg,
            t: detail.target_name,
            version: detail.version,
            thread_id: detail.thread_id,
            s: TruncatedSender {
                public_did: sender.public_did,
                n: sender.name,
                d: sender.did,
                l: sender.logo_url,
                v: sender.ver_key,
                dp: TruncatedProof {
                    d: sender.agent_key_dlg_proof.agent_did,
                    k: sender.agent_key_dlg_proof.agent_delegated_key,
                    s: sender.agent_key_dlg_proof.signature,
                },
            },
            sa: TruncatedAgency {
                d: agency.did,
                e: agency.endpoint,
                v: agency.ver_key,
            },
        }
    }
}

/// Shorten an invite detail into the compact form used in QR codes and invite links
pub fn truncate_invite_details(invite_detail: &Value) -> Result<Value, MessageError> {
    let detail: InviteDetail = serde_json::from_value(invite_detail.clone())
        .map_err(|err| MessageError::JSONError(err.to_string()))?;

    serde_json::to_value(TruncatedInviteDetail::from(detail))
        .map_err(|err| MessageError::JSONError(err.to_string()))
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectingMessage {
    InviteDetail(Value),
    Accepted { sender_did: Option<String> },
    ProblemReport(ProblemReport),
    Unexpected(String),
}

impl FamilyMessage for ConnectingMessage {
    fn decode(message_name: &str, envelope: &Envelope) -> Self {
        match message_name {
            MSG_CONN_REQUEST_RESP => match envelope.get(FIELD_INVITE_DETAIL) {
                Some(detail) => Self::InviteDetail(detail.clone()),
                None => Self::Unexpected(unexpected(
                    message_name,
                    &MessageError::MissingField(FIELD_INVITE_DETAIL.to_string()).to_string(),
                )),
            },
            MSG_CONN_REQ_ACCEPTED => Self::Accepted {
                sender_did: envelope
                    .get(FIELD_SENDER_DETAIL)
                    .and_then(|sender| sender.get(FIELD_SENDER_DID))
                    .and_then(Value::as_str)
                    .map(String::from),
            },
            MSG_PROBLEM_REPORT => Self::ProblemReport(ProblemReport::from_envelope(envelope)),
            _ => Self::Unexpected(unexpected(message_name, "not part of connecting")),
        }
    }

    fn failure(&self) -> Option<String> {
        match self {
            Self::ProblemReport(report) => Some(report.to_string()),
            Self::Unexpected(reason) => Some(reason.clone()),
            _ => None,
        }
    }
}

/// `Connecting` creates a pairwise connection invitation and follows it until accepted
///
/// The exchange has two steps on the same thread: the agent first answers with the invite
/// detail, then later reports the acceptance once the invitee answered.
#[derive(Debug, Clone)]
pub struct Connecting {
    protocol: Protocol,
    source_id: String,
    include_public_did: bool,
}

impl Connecting {
    pub fn family() -> MessageFamily {
        MessageFamily::known(Qualifier::Agency, FAMILY, VERSION)
    }

    pub fn new(source_id: &str, include_public_did: bool, thread_id: Option<ThreadID>) -> Self {
        Self {
            protocol: Protocol::new(Self::family(), None, thread_id),
            source_id: source_id.to_string(),
            include_public_did,
        }
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn connect_msg(&self) -> Envelope {
        self.protocol
            .base_message(MSG_CREATE_CONNECTION)
            .with(FIELD_SOURCE_ID, self.source_id.as_str())
            .with(FIELD_INCLUDE_PUBLIC_DID, self.include_public_did)
    }

    pub async fn connect_msg_packed<TCrypto, TTransport>(
        &self,
        session: &Session<TCrypto, TTransport>,
    ) -> Result<Vec<u8>, ProtocolError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        session.pack(&self.protocol, &self.connect_msg()).await
    }

    /// Create the connection, returning the invite detail to hand over to the invitee
    pub async fn connect<TCrypto, TTransport>(
        &self,
        session: &Session<TCrypto, TTransport>,
    ) -> Result<Value, CorrelationError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        let message: ConnectingMessage = session
            .request_expecting(
                &self.protocol,
                &self.connect_msg(),
                &[MSG_CONN_REQUEST_RESP],
            )
            .await?;

        match message {
            ConnectingMessage::InviteDetail(detail) => Ok(detail),
            other => Err(CorrelationError::Rejected(format!("{:?}", other))),
        }
    }

    /// Listen for the acceptance of this connection, nothing is sent
    pub fn accepted_exchange<TCrypto, TTransport>(
        &self,
        session: &Session<TCrypto, TTransport>,
    ) -> Exchange<ConnectingMessage>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        session.exchange_expecting(&self.protocol, &[MSG_CONN_REQ_ACCEPTED])
    }

    /// Wait for the invitee to accept, returning its DID when the agent reports it
    pub async fn wait_accepted<TCrypto, TTransport>(
        &self,
        session: &Session<TCrypto, TTransport>,
    ) -> Result<Option<String>, CorrelationError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        match self.accepted_exchange(session).wait().await? {
            ConnectingMessage::Accepted { sender_did } => Ok(sender_did),
            other => Err(CorrelationError::Rejected(format!("{:?}", other))),
        }
    }
}
