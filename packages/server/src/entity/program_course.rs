use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A course offering: one course taught for a program in a given
/// semester, section and year.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "program_course")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(unique_key = "offering")]
    pub program_id: i64,
    #[sea_orm(belongs_to, from = "program_id", to = "id")]
    pub program: HasOne<super::program::Entity>,

    #[sea_orm(unique_key = "offering")]
    pub course_id: String,
    #[sea_orm(belongs_to, from = "course_id", to = "id")]
    pub course: HasOne<super::course::Entity>,

    #[sea_orm(unique_key = "offering")]
    pub semester_id: i32,
    #[sea_orm(belongs_to, from = "semester_id", to = "id")]
    pub semester: HasOne<super::semester::Entity>,

    #[sea_orm(unique_key = "offering")]
    pub section_id: i32,
    #[sea_orm(belongs_to, from = "section_id", to = "id")]
    pub section: HasOne<super::section::Entity>,

    #[sea_orm(unique_key = "offering")]
    pub year: i32,
}

impl ActiveModelBehavior for ActiveModel {}
