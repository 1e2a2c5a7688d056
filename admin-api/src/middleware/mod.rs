mod auth;

pub use auth::{
    bearer_token, require_backoffice, require_property, require_session, resolve_session,
    session_status, verify_token, Claims, CurrentOperator, CurrentSession, PAGE_PATH_HEADER,
};
