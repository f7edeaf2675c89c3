/// Middleware module

mod route_guard;

pub use route_guard::{classify, decide, GuardDecision, RouteClass, RouteGuard, TokenState};
pub use route_guard::{HOME_PATH, SIGN_IN_PATH, VERIFY_PATH};
