use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::{catalog, clo, course, course_plo, offering, plo, plo_clo, program};
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(program_routes())
        .merge(plo_routes())
        .merge(course_routes())
        .merge(offering_routes())
        .merge(clo_routes())
        .merge(catalog_routes())
}

fn program_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(program::list_programs, program::create_program))
        .routes(routes!(
            program::get_program,
            program::update_program,
            program::delete_program
        ))
        .routes(routes!(
            program::list_program_plos,
            program::link_program_plos
        ))
        .routes(routes!(
            program::update_program_plo,
            program::unlink_program_plo
        ))
        .routes(routes!(program::list_program_offerings))
        .routes(routes!(program::list_program_years))
        .routes(routes!(
            course_plo::list_course_plos,
            course_plo::create_course_plos,
            course_plo::update_course_plo
        ))
}

fn plo_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(plo::create_plo))
        .routes(routes!(plo::import_plos))
}

fn course_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(course::list_courses, course::create_course))
        .routes(routes!(course::update_course, course::delete_course))
        .routes(routes!(course::rename_course))
}

fn offering_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            offering::list_offerings,
            offering::create_offering,
            offering::delete_offerings
        ))
        .routes(routes!(offering::import_offerings))
}

fn clo_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(clo::list_clos, clo::create_clo))
        .routes(routes!(clo::import_clos))
        .routes(routes!(clo::update_clo, clo::delete_clo_link))
        .routes(routes!(clo::link_clo))
        .routes(routes!(plo_clo::list_plo_clos))
}

fn catalog_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(catalog::list_semesters))
        .routes(routes!(catalog::list_sections))
}
