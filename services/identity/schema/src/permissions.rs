use sea_orm::entity::prelude::*;

/// A single grant in `action:entity:access` form, e.g. "delete:user:any".
/// Unique on the (action, entity, access) triple.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "permissions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// e.g. create, read, update, delete.
    pub action: String,
    /// e.g. note, user.
    pub entity: String,
    /// "own" or "any".
    pub access: String,
    pub description: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::permission_roles::Entity")]
    PermissionRoles,
}

impl Related<super::permission_roles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PermissionRoles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
