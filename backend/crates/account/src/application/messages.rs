//! Response messages shared by handlers and collaborators

pub const USER_REGISTERED: &str = "User successfully registered";
pub const USER_VERIFIED: &str = "User successfully verified";
pub const USER_NOT_FOUND: &str = "User not found";
pub const PROVIDE_VALID_EMAIL_CODE: &str = "Provide a valid email or verification code";
pub const VERIFICATION_EMAIL_MESSAGE: &str =
    "Verification email sent. Please check your inbox to activate your account";
pub const VALID_TOKEN: &str = "Valid Token";
pub const PASSWORD_UPDATED: &str = "Password updated.";
pub const INVALID_CODE: &str = "Invalid code";
pub const PASSWORD_CHANGED: &str = "Success";
pub const USERNAME_CHANGED: &str = "Username successfully changed";
pub const TOKEN_REMOVED: &str = "Token removed";

/// Answer to a password-reset request, sent whether or not the user exists
pub fn password_request_sent(email: &str) -> String {
    format!("Password request sent to: {email}")
}

pub fn account_deactivated(email: &str) -> String {
    format!("Account {email} deactivated")
}
