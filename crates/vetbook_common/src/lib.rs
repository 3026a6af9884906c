// Declare modules within this crate
pub mod error; // Error taxonomy
pub mod http; // HTTP utilities
pub mod logging; // Logging utilities
pub mod models; // Slots, bookings, roles
pub mod services; // Service abstractions
pub mod session; // Session credentials

// Re-export error types and utilities for easier access
pub use error::{
    auth_error, busy, config_error, forbidden, service_error, validation_error, ErrorKind,
    VetbookError,
};

// Re-export HTTP utilities for easier access
pub use http::{
    client::{bearer, create_client},
    ensure_success, error_message_from_body,
};

pub use models::{
    Booking, BookingRequest, BookingStatus, LoginRequest, LoginResponse, NewSlot, Person,
    RegisterRequest, Role, Slot,
};
pub use services::{AuthService, BoxFuture, VetService};
pub use session::{require_role, require_token, Session, StaticSession};
