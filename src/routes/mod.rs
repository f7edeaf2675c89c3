mod account;
mod assistant;
mod health_check;
mod messages;
mod register;
mod sign_in;
mod verify;

pub use account::{current_user, toggle_acceptance};
pub use assistant::{analyze_sentiment, enhance_message, generate_message};
pub use health_check::health_check;
pub use messages::{delete_message, get_messages, send_message};
pub use register::{check_username, register};
pub use sign_in::{sign_in, sign_out};
pub use verify::verify_email;
