/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Session identity.

use crate::types::CompId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one logical FIX session.
///
/// The triple is immutable once built and is used as the key for per-session
/// loggers and for correlating logon/logout callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionIdentity {
    begin_string: String,
    sender_comp_id: CompId,
    target_comp_id: CompId,
}

impl SessionIdentity {
    /// Creates a new session identity.
    ///
    /// # Arguments
    /// * `begin_string` - The FIX version (e.g., "FIX.4.4")
    /// * `sender_comp_id` - Our CompID
    /// * `target_comp_id` - The counterparty CompID
    #[must_use]
    pub fn new(
        begin_string: impl Into<String>,
        sender_comp_id: CompId,
        target_comp_id: CompId,
    ) -> Self {
        Self {
            begin_string: begin_string.into(),
            sender_comp_id,
            target_comp_id,
        }
    }

    /// Returns the BeginString.
    #[must_use]
    pub fn begin_string(&self) -> &str {
        &self.begin_string
    }

    /// Returns the SenderCompID.
    #[must_use]
    pub fn sender_comp_id(&self) -> &CompId {
        &self.sender_comp_id
    }

    /// Returns the TargetCompID.
    #[must_use]
    pub fn target_comp_id(&self) -> &CompId {
        &self.target_comp_id
    }
}

impl fmt::Display for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}->{}",
            self.begin_string, self.sender_comp_id, self.target_comp_id
        )
    }
}
