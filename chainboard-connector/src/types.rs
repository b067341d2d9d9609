//! Core data model shared by the session and feed components.
//!
//! Everything here is a read-only projection of contract state. Records are
//! never mutated locally; edits and deletions go out as transactions and the
//! rendered view is rebuilt from a fresh read afterwards.

use std::fmt;
use std::str::FromStr;

use crate::error::ConnectorError;

/// A 20-byte account or contract identifier.
///
/// Parsing accepts the canonical `0x`-prefixed 40-hex-digit form in any
/// letter case. Display renders lowercase hex. Checksum computation is owned
/// by the external client binding; this type only enforces syntax.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// The elided display form used in status lines and message metadata,
    /// e.g. `0x12ab…cd34`.
    pub fn short(&self) -> String {
        let full = self.to_string();
        format!("{}…{}", &full[..6], &full[full.len() - 4..])
    }
}

impl FromStr for Address {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_part = s
            .strip_prefix("0x")
            .ok_or_else(|| ConnectorError::InvalidAddress(s.to_string()))?;
        if hex_part.len() != 40 {
            return Err(ConnectorError::InvalidAddress(s.to_string()));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(hex_part, &mut bytes)
            .map_err(|_| ConnectorError::InvalidAddress(s.to_string()))?;
        Ok(Address(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

/// One board entry, as returned by the contract's paged read interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    /// Monotonic, contract-assigned identifier.
    pub id: u64,
    pub author: Address,
    pub content: String,
    /// Seconds since epoch.
    pub created_at: u64,
    /// Seconds since epoch; zero when never edited.
    pub edited_at: u64,
    pub is_deleted: bool,
    /// Zero means no parent.
    pub parent_id: u64,
}

/// Advisory limits read from the contract once per retarget. They inform the
/// compose UI; the contract itself enforces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardLimits {
    pub post_fee_wei: u128,
    pub rate_limit_secs: u64,
    pub max_content_bytes: u64,
}

/// Placeholder shown in place of soft-deleted content.
pub const REDACTED_CONTENT: &str = "[deleted]";

/// The projection handed to the render port.
///
/// Redaction and the author-only affordance decision happen here, before the
/// view boundary, so no renderer can accidentally leak deleted content or
/// offer edit/delete on foreign records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub id: u64,
    pub author: Address,
    pub content: String,
    pub created_at: u64,
    pub edited_at: u64,
    pub deleted: bool,
    pub parent_id: Option<u64>,
    /// True when the current viewer authored this record and it is not
    /// deleted; gates the edit/delete affordances.
    pub own: bool,
}

impl RenderedMessage {
    /// Projects a raw record for the given viewer.
    pub fn project(record: &MessageRecord, viewer: Option<Address>) -> Self {
        let content = if record.is_deleted {
            REDACTED_CONTENT.to_string()
        } else {
            record.content.clone()
        };
        let own = !record.is_deleted && viewer.is_some_and(|v| v == record.author);
        Self {
            id: record.id,
            author: record.author,
            content,
            created_at: record.created_at,
            edited_at: record.edited_at,
            deleted: record.is_deleted,
            parent_id: (record.parent_id != 0).then_some(record.parent_id),
            own,
        }
    }
}
