//! Event domain model, occupancy arithmetic and event DTOs.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use super::user::AttendeeInfo;

/// Default page size of the administrative listing.
pub const DEFAULT_ADMIN_PAGE_SIZE: u32 = 25;

/// Hard ceiling on the administrative page size.
pub const MAX_ADMIN_PAGE_SIZE: u32 = 100;

/// Event domain model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub pub_date: DateTime<Utc>,
    pub event_date: NaiveDate,
    pub starts_at: NaiveTime,
    pub ends_at: NaiveTime,
    pub location: String,
    pub description: String,
    pub price: i64,
    /// `None` means unlimited.
    pub capacity: Option<i32>,
    pub is_featured: bool,
    /// `data:` URL, see `shared::image`.
    pub image_base64: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// `HH:MM - HH:MM`.
    pub fn time_range(&self) -> String {
        format!(
            "{} - {}",
            self.starts_at.format("%H:%M"),
            self.ends_at.format("%H:%M")
        )
    }

    /// "Free" for zero, otherwise `$` with thousands separators.
    pub fn price_display(&self) -> String {
        if self.price == 0 {
            "Free".to_string()
        } else {
            format!("${}", group_thousands(self.price))
        }
    }
}

/// An event together with its current attendee count.
#[derive(Debug, Clone, PartialEq)]
pub struct EventWithCount {
    pub event: Event,
    pub attendees_count: i64,
}

impl EventWithCount {
    pub fn occupancy(&self) -> Occupancy {
        Occupancy::new(self.event.capacity, self.attendees_count)
    }
}

/// Capacity vs. enrolled count of a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupancy {
    pub capacity: Option<i32>,
    pub attendees: i64,
}

impl Occupancy {
    pub fn new(capacity: Option<i32>, attendees: i64) -> Self {
        Self {
            capacity,
            attendees,
        }
    }

    /// `None` when capacity is unlimited; never negative.
    pub fn remaining_slots(&self) -> Option<i64> {
        self.capacity
            .map(|cap| (i64::from(cap) - self.attendees).max(0))
    }

    pub fn is_full(&self) -> bool {
        match self.capacity {
            Some(cap) => self.attendees >= i64::from(cap),
            None => false,
        }
    }

    /// Occupancy bucket. A zero capacity counts as 0% occupied.
    pub fn status(&self) -> CapacityStatus {
        let cap = match self.capacity {
            None => return CapacityStatus::Unlimited,
            Some(cap) => i64::from(cap),
        };
        if cap <= 0 {
            return CapacityStatus::Available;
        }
        let scaled = self.attendees.saturating_mul(100);
        if scaled >= 100 * cap {
            CapacityStatus::Full
        } else if scaled >= 80 * cap {
            CapacityStatus::AlmostFull
        } else if scaled >= 50 * cap {
            CapacityStatus::HalfFull
        } else {
            CapacityStatus::Available
        }
    }

    pub fn income(&self, price: i64) -> i64 {
        price.saturating_mul(self.attendees)
    }
}

/// Occupancy bucket shown in the administrative listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityStatus {
    Unlimited,
    Available,
    HalfFull,
    AlmostFull,
    Full,
}

impl CapacityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapacityStatus::Unlimited => "unlimited",
            CapacityStatus::Available => "available",
            CapacityStatus::HalfFull => "half_full",
            CapacityStatus::AlmostFull => "almost_full",
            CapacityStatus::Full => "full",
        }
    }
}

/// Public representation of an event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EventResponse {
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
    pub attendees_count: i64,
    pub remaining_slots: Option<i64>,
    pub is_full: bool,
    /// Present only for authenticated callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_attending: Option<bool>,
}

impl From<EventWithCount> for EventResponse {
    fn from(row: EventWithCount) -> Self {
        let occupancy = row.occupancy();
        let event = row.event;
        Self {
            id: event.id,
            name: event.name,
            pub_date: event.pub_date,
            event_date: event.event_date,
            starts_at: event.starts_at,
            ends_at: event.ends_at,
            location: event.location,
            description: event.description,
            price: event.price,
            capacity: event.capacity,
            is_featured: event.is_featured,
            image_base64: event.image_base64,
            attendees_count: occupancy.attendees,
            remaining_slots: occupancy.remaining_slots(),
            is_full: occupancy.is_full(),
            is_attending: None,
        }
    }
}

impl EventResponse {
    pub fn with_attendance(mut self, is_attending: bool) -> Self {
        self.is_attending = Some(is_attending);
        self
    }
}

/// Response for the featured-event endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct FeaturedEventResponse {
    pub event: Option<EventResponse>,
}

/// Response for the public event listing.
#[derive(Debug, Clone, Serialize)]
pub struct ListEventsResponse {
    pub data: Vec<EventResponse>,
}

/// One row of the administrative listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AdminEventRow {
    pub id: i64,
    pub name: String,
    pub pub_date: DateTime<Utc>,
    pub event_date: NaiveDate,
    pub time_range: String,
    pub location: String,
    pub price: i64,
    pub price_display: String,
    pub capacity: Option<i32>,
    pub is_featured: bool,
    pub has_image: bool,
    pub attendees_count: i64,
    pub remaining_slots: Option<i64>,
    pub is_full: bool,
    pub capacity_status: CapacityStatus,
    pub income: i64,
}

impl From<EventWithCount> for AdminEventRow {
    fn from(row: EventWithCount) -> Self {
        let occupancy = row.occupancy();
        let event = row.event;
        Self {
            id: event.id,
            time_range: event.time_range(),
            price_display: event.price_display(),
            has_image: event.image_base64.is_some(),
            income: occupancy.income(event.price),
            name: event.name,
            pub_date: event.pub_date,
            event_date: event.event_date,
            location: event.location,
            price: event.price,
            capacity: event.capacity,
            is_featured: event.is_featured,
            attendees_count: occupancy.attendees,
            remaining_slots: occupancy.remaining_slots(),
            is_full: occupancy.is_full(),
            capacity_status: occupancy.status(),
        }
    }
}

/// Administrative detail view, including the attendee list.
#[derive(Debug, Clone, Serialize)]
pub struct AdminEventDetail {
    #[serde(flatten)]
    pub event: EventResponse,
    pub capacity_status: CapacityStatus,
    pub income: i64,
    pub attendees: Vec<AttendeeInfo>,
}

impl AdminEventDetail {
    pub fn new(row: EventWithCount, attendees: Vec<AttendeeInfo>) -> Self {
        let occupancy = row.occupancy();
        let income = occupancy.income(row.event.price);
        Self {
            event: EventResponse::from(row),
            capacity_status: occupancy.status(),
            income,
            attendees,
        }
    }
}

/// Query parameters of the administrative listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminEventListQuery {
    /// Case-insensitive match on name, location or description.
    pub q: Option<String>,
    pub is_featured: Option<bool>,
    pub location: Option<String>,
    pub event_date_from: Option<NaiveDate>,
    pub event_date_to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl AdminEventListQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self, default: u32) -> u32 {
        self.per_page
            .unwrap_or(default)
            .clamp(1, MAX_ADMIN_PAGE_SIZE)
    }

    /// Trimmed search term, `None` when empty.
    pub fn search_term(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Pagination metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: u32,
}

impl Pagination {
    pub fn new(page: u32, per_page: u32, total: i64) -> Self {
        let per_page_i64 = i64::from(per_page.max(1));
        let total_pages = ((total.max(0) + per_page_i64 - 1) / per_page_i64) as u32;
        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }
}

/// Response for the administrative listing.
#[derive(Debug, Clone, Serialize)]
pub struct AdminEventListResponse {
    pub data: Vec<AdminEventRow>,
    pub pagination: Pagination,
}

/// Every writable field of an event, as it would be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub name: String,
    pub event_date: NaiveDate,
    pub starts_at: NaiveTime,
    pub ends_at: NaiveTime,
    pub location: String,
    pub description: String,
    pub price: i64,
    pub capacity: Option<i32>,
    pub is_featured: bool,
}

/// Request to create an event.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateEventRequest {
    #[validate(
        length(min = 1, max = 254, message = "Name must be 1-254 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub name: String,
    pub event_date: NaiveDate,
    pub starts_at: NaiveTime,
    pub ends_at: NaiveTime,
    #[validate(
        length(min = 1, max = 254, message = "Location must be 1-254 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub location: String,
    #[validate(
        length(min = 1, max = 254, message = "Description must be 1-254 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub description: String,
    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price: i64,
    #[validate(range(min = 0, message = "Capacity cannot be negative"))]
    pub capacity: Option<i32>,
    #[serde(default)]
    pub is_featured: bool,
}

impl CreateEventRequest {
    pub fn into_draft(self) -> EventDraft {
        EventDraft {
            name: self.name.trim().to_string(),
            event_date: self.event_date,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            location: self.location.trim().to_string(),
            description: self.description.trim().to_string(),
            price: self.price,
            capacity: self.capacity,
            is_featured: self.is_featured,
        }
    }
}

/// Partial update of an event.
///
/// `capacity` distinguishes an absent key (leave unchanged) from an explicit
/// `null` (make unlimited).
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateEventRequest {
    #[validate(
        length(min = 1, max = 254, message = "Name must be 1-254 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub name: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub starts_at: Option<NaiveTime>,
    pub ends_at: Option<NaiveTime>,
    #[validate(
        length(min = 1, max = 254, message = "Location must be 1-254 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub location: Option<String>,
    #[validate(
        length(min = 1, max = 254, message = "Description must be 1-254 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub description: Option<String>,
    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price: Option<i64>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub capacity: Option<Option<i32>>,
    pub is_featured: Option<bool>,
}

impl UpdateEventRequest {
    /// Merges the supplied fields over the current state of `event`.
    pub fn apply_to(self, event: &Event) -> EventDraft {
        EventDraft {
            name: self
                .name
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| event.name.clone()),
            event_date: self.event_date.unwrap_or(event.event_date),
            starts_at: self.starts_at.unwrap_or(event.starts_at),
            ends_at: self.ends_at.unwrap_or(event.ends_at),
            location: self
                .location
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| event.location.clone()),
            description: self
                .description
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| event.description.clone()),
            price: self.price.unwrap_or(event.price),
            capacity: self.capacity.unwrap_or(event.capacity),
            is_featured: self.is_featured.unwrap_or(event.is_featured),
        }
    }
}

/// Response of the direct feature action.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureEventResponse {
    pub event: EventResponse,
    /// Event that lost featured status, if any.
    pub previously_featured_id: Option<i64>,
}

/// Maps a present key to `Some(value)`, so `null` becomes `Some(None)`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
