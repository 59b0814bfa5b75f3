use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Attaches a CLO to one offering of a course.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "course_clo")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(unique_key = "course_clo_link")]
    pub course_id: String,
    #[sea_orm(belongs_to, from = "course_id", to = "id")]
    pub course: HasOne<super::course::Entity>,

    #[sea_orm(unique_key = "course_clo_link")]
    pub semester_id: i32,
    #[sea_orm(unique_key = "course_clo_link")]
    pub section_id: i32,
    #[sea_orm(unique_key = "course_clo_link")]
    pub year: i32,

    #[sea_orm(unique_key = "course_clo_link")]
    pub clo_id: i64,
    #[sea_orm(belongs_to, from = "clo_id", to = "id")]
    pub clo: HasOne<super::clo::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
