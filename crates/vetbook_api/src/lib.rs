//! REST client for the vet booking service.
//!
//! [`RestVetService`] implements [`vetbook_common::VetService`] and
//! [`vetbook_common::AuthService`] on top of `reqwest`.
//!
//! # Example
//!
//! ```rust,no_run
//! use vetbook_api::RestVetService;
//! use vetbook_common::VetService;
//! use vetbook_config::ApiConfig;
//!
//! async fn list_slots() -> Result<(), vetbook_common::VetbookError> {
//!     let service = RestVetService::new(&ApiConfig::default())?;
//!     for slot in service.fetch_slots().await? {
//!         println!("{} ({} min)", slot.start_at, slot.duration_minutes);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;

pub use client::RestVetService;
