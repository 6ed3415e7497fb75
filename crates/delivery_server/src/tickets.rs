//! Ticket id issuance.

use uuid::Uuid;

/// Prefix on every ticket id
pub const TICKET_PREFIX: &str = "D-";

/// Issue a fresh ticket id: `D-` followed by eight uppercase hex digits.
pub fn issue_ticket_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}{}", TICKET_PREFIX, hex[..8].to_uppercase())
}
