use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Weighted contribution of a CLO to a PLO within one offering.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plo_clo")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub plo_id: i64,
    #[sea_orm(belongs_to, from = "plo_id", to = "id")]
    pub plo: HasOne<super::plo::Entity>,

    pub clo_id: i64,
    #[sea_orm(belongs_to, from = "clo_id", to = "id")]
    pub clo: HasOne<super::clo::Entity>,

    pub weight: f64,
    pub year: i32,
    pub semester_id: i32,
    pub section_id: i32,

    pub course_id: String,
    #[sea_orm(belongs_to, from = "course_id", to = "id")]
    pub course: HasOne<super::course::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
