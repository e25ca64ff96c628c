// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Souk Core
//!
//! Core types, error taxonomy, and traits shared by every Souk crate.
//!
//! This crate holds pure data and no I/O:
//!
//! - The closed error taxonomy callers switch on
//! - The result alias and its combinators
//! - Request descriptions and their in-flight identity
//! - Credentials, auth state, and the user profile
//! - The token traits implemented by the host's secure storage
//!
//! ## Key Types
//!
//! ### Errors & Results
//! - [`ApiError`] - Classified failure with a default user-facing message
//! - [`ApiResult`] - `Result<T, ApiError>`
//! - [`ApiResultExt`] - `on_success` / `on_failure` / `value_or`
//!
//! ### Requests
//! - [`Request`] - Method, URL, optional body, headers, auth flag
//! - [`InFlightKey`] - Identity used to share identical in-flight reads
//!
//! ### Auth
//! - [`AuthState`] - Unknown / Unauthenticated / Authenticated
//! - [`Credentials`] - Validated token pair
//! - [`UserProfile`] - The signed-in user
//! - [`TokenSource`], [`TokenStore`] - Host storage seams

pub mod error;
pub mod models;
pub mod traits;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    // Errors & results
    ApiError,
    ApiResult,
    ApiResultExt,
    DEFAULT_DECODING_ERROR_MESSAGE,
    DEFAULT_SERVER_ERROR_MESSAGE,
    DEFAULT_UNKNOWN_ERROR_MESSAGE,
    ErrorCause,
    // Auth
    AuthState,
    Credentials,
    UserProfile,
    is_valid_jwt_shape,
    // Requests
    HttpMethod,
    InFlightKey,
    Request,
};

// Re-export traits
pub use traits::{TokenSource, TokenStore};
