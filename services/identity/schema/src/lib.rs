//! sea-orm entities for the identity service tables.

pub mod connections;
pub mod outbox_events;
pub mod passwords;
pub mod permission_roles;
pub mod permissions;
pub mod role_users;
pub mod roles;
pub mod sessions;
pub mod users;
pub mod verifications;
