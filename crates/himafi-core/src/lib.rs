//! Shared client library for the HIMAFI career portal: the content domain
//! model, a typed API client, form validation, prefixed key-value storage,
//! and date helpers.

pub mod api;
pub mod constants;
pub mod dates;
pub mod model;
pub mod storage;
pub mod validation;

pub use api::{ApiClient, ApiError, ApiResult};
pub use constants::Features;
pub use model::{
    Alumni, ApiResponse, Article, CareerStats, Comment, ContactForm, Event, EventKind, Favorite,
    FavoriteKind, MentorshipForm, Opportunity, OpportunityKind, User, UserRole,
};
pub use storage::{SessionStorage, Storage, StorageKey, STORAGE_PREFIX};
pub use validation::{validate_form, Rule, ValidationResult, Validator};
