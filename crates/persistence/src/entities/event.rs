//! Event entities (database row mappings).

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the events table.
#[derive(Debug, Clone, FromRow)]
pub struct EventEntity {
    pub id: i64,
    pub name: String,
    pub pub_date: DateTime<Utc>,
    pub event_date: NaiveDate,
    pub starts_at: NaiveTime,
    pub ends_at: NaiveTime,
    pub location: String,
    pub description: String,
    pub price: i64,
    pub capacity: Option<i32>,
    pub is_featured: bool,
    pub image_base64: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EventEntity> for domain::models::Event {
    fn from(entity: EventEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            pub_date: entity.pub_date,
            event_date: entity.event_date,
            starts_at: entity.starts_at,
            ends_at: entity.ends_at,
            location: entity.location,
            description: entity.description,
            price: entity.price,
            capacity: entity.capacity,
            is_featured: entity.is_featured,
            image_base64: entity.image_base64,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Event row joined with its attendee count.
#[derive(Debug, Clone, FromRow)]
pub struct EventWithCountEntity {
    #[sqlx(flatten)]
    pub event: EventEntity,
    pub attendees_count: i64,
}

impl From<EventWithCountEntity> for domain::models::EventWithCount {
    fn from(entity: EventWithCountEntity) -> Self {
        Self {
            event: entity.event.into(),
            attendees_count: entity.attendees_count,
        }
    }
}

/// Attendee row for the administrative event detail.
#[derive(Debug, Clone, FromRow)]
pub struct AttendeeEntity {
    pub user_id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub joined_at: DateTime<Utc>,
}

impl From<AttendeeEntity> for domain::models::AttendeeInfo {
    fn from(entity: AttendeeEntity) -> Self {
        let full_name = format!("{} {}", entity.first_name.trim(), entity.last_name.trim())
            .trim()
            .to_string();
        Self {
            user_id: entity.user_id,
            full_name: if full_name.is_empty() {
                entity.username.clone()
            } else {
                full_name
            },
            username: entity.username,
            email: entity.email,
            joined_at: entity.joined_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::AttendeeInfo;

    fn attendee(first: &str, last: &str) -> AttendeeEntity {
        AttendeeEntity {
            user_id: 5,
            username: "jdoe".to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: "jdoe@example.com".to_string(),
            joined_at: Utc::now(),
        }
    }

    #[test]
    fn test_attendee_full_name() {
        let info: AttendeeInfo = attendee("Jane", "Doe").into();
        assert_eq!(info.full_name, "Jane Doe");
    }

    #[test]
    fn test_attendee_full_name_falls_back_to_username() {
        let info: AttendeeInfo = attendee("", "").into();
        assert_eq!(info.full_name, "jdoe");
    }
}
