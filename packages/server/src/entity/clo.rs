use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Course learning outcome.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clo")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub code: String,
    #[sea_orm(column_type = "Text")]
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub engname: String,

    #[sea_orm(has_many)]
    pub links: HasMany<super::course_clo::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
