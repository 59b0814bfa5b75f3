use sea_orm::sea_query::{Index, IndexCreateStatement, OnConflict, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::entity::{course_clo, course_plo, plo_clo, program_course, semester};

/// Semesters present in every deployment.
const DEFAULT_SEMESTERS: &[(i32, &str)] = &[(1, "First"), (2, "Second"), (3, "Summer")];

/// Seed the `semester` table with defaults. Existing rows are left untouched.
pub async fn seed_semesters(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut inserted = 0u32;
    for &(id, name) in DEFAULT_SEMESTERS {
        let model = semester::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
        };

        let result = semester::Entity::insert(model)
            .on_conflict(
                OnConflict::column(semester::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(0) | Err(DbErr::RecordNotInserted) => {}
            Ok(_) => inserted += 1,
            Err(e) => return Err(e),
        }
    }

    if inserted > 0 {
        info!("Seeded {} new semesters", inserted);
    }
    Ok(())
}

/// Ensure lookup indexes exist.
///
/// Schema sync only creates the unique keys declared on entities; the
/// secondary indexes used by CLO and mapping lookups are created here.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let indexes: Vec<(&str, IndexCreateStatement)> = vec![
        // Offerings by course, for renames and reference checks.
        (
            "idx_program_course_course",
            Index::create()
                .table(program_course::Entity)
                .col(program_course::Column::CourseId)
                .to_owned(),
        ),
        // Remaining links of a CLO when a link is removed.
        (
            "idx_course_clo_clo",
            Index::create()
                .table(course_clo::Entity)
                .col(course_clo::Column::CloId)
                .to_owned(),
        ),
        (
            "idx_course_plo_plo",
            Index::create()
                .table(course_plo::Entity)
                .col(course_plo::Column::PloId)
                .to_owned(),
        ),
        (
            "idx_plo_clo_clo",
            Index::create()
                .table(plo_clo::Entity)
                .col(plo_clo::Column::CloId)
                .to_owned(),
        ),
        (
            "idx_plo_clo_course",
            Index::create()
                .table(plo_clo::Entity)
                .col(plo_clo::Column::CourseId)
                .to_owned(),
        ),
    ];

    for (name, mut index) in indexes {
        let stmt = index
            .if_not_exists()
            .name(name)
            .to_string(PostgresQueryBuilder);

        match db.execute_unprepared(&stmt).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => tracing::warn!("Failed to create index {}: {}", name, e),
        }
    }

    Ok(())
}
