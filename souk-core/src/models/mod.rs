//! Domain models for Souk.
//!
//! ## Submodules
//!
//! - [`api_error`] - Classified errors and the result alias
//! - [`request`] - Request description and in-flight identity
//! - [`credentials`] - Token pair and JWT shape check
//! - [`auth`] - Session authentication state
//! - [`profile`] - The signed-in user's profile

mod api_error;
mod auth;
mod credentials;
mod profile;
mod request;

pub use api_error::{
    ApiError, ApiResult, ApiResultExt, DEFAULT_DECODING_ERROR_MESSAGE,
    DEFAULT_SERVER_ERROR_MESSAGE, DEFAULT_UNKNOWN_ERROR_MESSAGE, ErrorCause,
};
pub use auth::AuthState;
pub use credentials::{Credentials, is_valid_jwt_shape};
pub use profile::UserProfile;
pub use request::{HttpMethod, InFlightKey, Request};
