use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "course")]
pub struct Model {
    /// Caller-supplied code such as `CS101`.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,
    pub engname: String,

    #[sea_orm(has_many)]
    pub offerings: HasMany<super::program_course::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
