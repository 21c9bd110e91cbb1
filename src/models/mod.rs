mod password_reset_token;
mod user;

pub use password_reset_token::{PasswordResetToken, ResetTokenState};
pub use user::{NewUser, PublicUser, User};
