use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "program_plo")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub program_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub plo_id: i64,
    #[sea_orm(belongs_to, from = "program_id", to = "id")]
    pub program: HasOne<super::program::Entity>,
    #[sea_orm(belongs_to, from = "plo_id", to = "id")]
    pub plo: HasOne<super::plo::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
