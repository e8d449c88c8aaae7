use sea_orm_migration::prelude::*;

mod m20260801_000001_create_users;
mod m20260801_000002_create_passwords;
mod m20260801_000003_create_sessions;
mod m20260801_000004_create_verifications;
mod m20260801_000005_create_roles;
mod m20260801_000006_create_permissions;
mod m20260801_000007_create_connections;
mod m20260801_000008_create_outbox_events;
mod m20260801_000009_seed_roles;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260801_000001_create_users::Migration),
            Box::new(m20260801_000002_create_passwords::Migration),
            Box::new(m20260801_000003_create_sessions::Migration),
            Box::new(m20260801_000004_create_verifications::Migration),
            Box::new(m20260801_000005_create_roles::Migration),
            Box::new(m20260801_000006_create_permissions::Migration),
            Box::new(m20260801_000007_create_connections::Migration),
            Box::new(m20260801_000008_create_outbox_events::Migration),
            Box::new(m20260801_000009_seed_roles::Migration),
        ]
    }
}
