use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatRoomRow {
    pub id: i64,
    pub user_one_id: i64,
    pub user_two_id: i64,
    pub job_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl ChatRoomRow {
    pub fn has_participant(&self, user_id: i64) -> bool {
        self.user_one_id == user_id || self.user_two_id == user_id
    }

    /// The participant that is not `user_id`.
    pub fn other_participant(&self, user_id: i64) -> i64 {
        if self.user_one_id == user_id {
            self.user_two_id
        } else {
            self.user_one_id
        }
    }
}

/// Orders a pair of user ids so each pair maps to exactly one room.
pub fn normalize_pair(a: i64, b: i64) -> (i64, i64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// A room as listed for one participant.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ChatRoomSummary {
    pub id: i64,
    pub job_id: Option<i64>,
    pub other_user_id: i64,
    pub other_user_name: String,
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MessageRow {
    pub id: i64,
    pub room_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_pair_is_order_independent() {
        assert_eq!(normalize_pair(9, 4), (4, 9));
        assert_eq!(normalize_pair(4, 9), (4, 9));
    }

    #[test]
    fn test_other_participant() {
        let room = ChatRoomRow {
            id: 1,
            user_one_id: 4,
            user_two_id: 9,
            job_id: None,
            created_at: Utc::now(),
        };
        assert_eq!(room.other_participant(4), 9);
        assert_eq!(room.other_participant(9), 4);
        assert!(room.has_participant(9));
        assert!(!room.has_participant(5));
    }
}
