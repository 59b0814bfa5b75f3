use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "program")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub name: String,

    #[sea_orm(has_many)]
    pub offerings: HasMany<super::program_course::Entity>,

    #[sea_orm(has_many, via = "program_plo")]
    pub plos: HasMany<super::plo::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
