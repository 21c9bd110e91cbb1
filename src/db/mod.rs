pub mod password_reset_tokens;
pub mod users;
