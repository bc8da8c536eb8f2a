//! Notification Task State Definitions
//!
//! State IDs are stable for PostgreSQL storage.

use std::fmt;

/// Notification task status
///
/// ```text
/// PENDING --claim--> IN_FLIGHT --success--> COMPLETED
///                        |
///                        +----failure--> FAILED
/// ```
///
/// Stored as SMALLINT. Terminal states: COMPLETED (20), FAILED (-10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum NotificationStatus {
    /// Created together with its transfer, waiting to be claimed
    Pending = 0,

    /// Claimed by an open dispatch transaction
    InFlight = 10,

    /// Terminal: notification delivered
    Completed = 20,

    /// Terminal: sender returned an error (reason recorded)
    Failed = -10,
}

impl NotificationStatus {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NotificationStatus::Completed | NotificationStatus::Failed
        )
    }

    /// Check whether `self -> next` is an allowed transition
    pub fn can_transition_to(&self, next: NotificationStatus) -> bool {
        matches!(
            (self, next),
            (NotificationStatus::Pending, NotificationStatus::InFlight)
                | (NotificationStatus::InFlight, NotificationStatus::Completed)
                | (NotificationStatus::InFlight, NotificationStatus::Failed)
        )
    }

    /// Get the numeric state ID for PostgreSQL storage
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    /// Convert from PostgreSQL state ID
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(NotificationStatus::Pending),
            10 => Some(NotificationStatus::InFlight),
            20 => Some(NotificationStatus::Completed),
            -10 => Some(NotificationStatus::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "PENDING",
            NotificationStatus::InFlight => "IN_FLIGHT",
            NotificationStatus::Completed => "COMPLETED",
            NotificationStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<i16> for NotificationStatus {
    type Error = ();

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        NotificationStatus::from_id(value).ok_or(())
    }
}
