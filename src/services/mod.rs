pub mod password;
pub use password::Password;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{
    AuthError, AuthService, AuthenticatedUser, Claims, SessionResult, TokenKind, UserInfo,
    extract_token_from_header,
};
pub use auth_service_impl::JwtAuthService;

pub mod user_service;
pub use user_service::{UserService, UserServiceError};

pub mod watched_item_service;
pub mod watched_item_service_impl;
pub use watched_item_service::{WatchedItemError, WatchedItemService};
pub use watched_item_service_impl::SeaOrmWatchedItemService;
