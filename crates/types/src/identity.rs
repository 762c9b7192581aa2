use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raw length of a participant identity.
pub const ID_BYTES: usize = 32;

const TEXT_PREFIX: char = 's';
const TEXT_LENGTH: usize = 1 + ID_BYTES * 2;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("participant id must start with 's'")]
    MissingPrefix,
    #[error("participant id must be 65 characters, got {0}")]
    WrongLength(usize),
    #[error("participant id payload is not valid hexadecimal: {0}")]
    BadHex(#[from] hex::FromHexError),
}

/// Identity of anything that can call into the ledger: participants, the
/// administrator and the governance engine itself.
///
/// Textual form is `s` followed by 64 hex digits. Serde goes through that form
/// so JSON records stay readable.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ParticipantId(pub [u8; ID_BYTES]);

impl ParticipantId {
    /// Derive a stable identity from an arbitrary label (handy for fixtures
    /// and for engine identities configured by name).
    pub fn from_label(label: &str) -> Self {
        ParticipantId(*blake3::hash(label.as_bytes()).as_bytes())
    }

    /// Parse the textual form. Hex digits are accepted in either case.
    pub fn parse(text: &str) -> Result<Self, IdentityError> {
        let payload = text
            .strip_prefix(TEXT_PREFIX)
            .ok_or(IdentityError::MissingPrefix)?;
        if text.len() != TEXT_LENGTH {
            return Err(IdentityError::WrongLength(text.len()));
        }
        let mut raw = [0u8; ID_BYTES];
        hex::decode_to_slice(payload, &mut raw)?;
        Ok(ParticipantId(raw))
    }

    pub fn as_bytes(&self) -> &[u8; ID_BYTES] {
        &self.0
    }
}

impl From<[u8; ID_BYTES]> for ParticipantId {
    fn from(value: [u8; ID_BYTES]) -> Self {
        ParticipantId(value)
    }
}

impl From<ParticipantId> for String {
    fn from(value: ParticipantId) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ParticipantId::parse(&value)
    }
}

impl FromStr for ParticipantId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParticipantId::parse(s)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TEXT_PREFIX}{}", hex::encode(self.0))
    }
}

// Short form keeps log lines and assertion output readable.
impl fmt::Debug for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParticipantId({TEXT_PREFIX}{}…)", hex::encode(&self.0[..4]))
    }
}
