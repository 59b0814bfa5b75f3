use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Program learning outcome.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plo")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub code: String,
    #[sea_orm(column_type = "Text")]
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub engname: String,

    #[sea_orm(has_many, via = "program_plo")]
    pub programs: HasMany<super::program::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
