pub mod password;
pub mod permission;
pub mod session;
pub mod signup;
pub mod user;
pub mod verification;
