//! Domain models for Certamen.

pub mod enrollment;
pub mod event;
pub mod user;

pub use enrollment::{JoinOutcome, JoinResponse, LeaveOutcome, LeaveResponse};
pub use event::{
    AdminEventDetail, AdminEventListQuery, AdminEventListResponse, AdminEventRow,
    CapacityStatus, CreateEventRequest, Event, EventDraft, EventResponse, EventWithCount,
    FeatureEventResponse, FeaturedEventResponse, ListEventsResponse, Occupancy, Pagination,
    UpdateEventRequest,
};
pub use user::{AttendeeInfo, User, UserProfile, UserResponse};
