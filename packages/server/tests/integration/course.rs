use crate::common::{Offering, TestApp, routes};
use common::upsert::{ErrorKind, UpsertError};
use sea_orm::ConnectionTrait;
use serde_json::json;

mod course_crud {
    use super::*;

    #[tokio::test]
    async fn create_list_and_search() {
        let app = TestApp::spawn().await;
        app.create_course("MA201", "Calculus").await;
        app.create_course("CS101", "Programming").await;

        let res = app.get(routes::COURSES).await;
        assert_eq!(res.status, 200);
        let ids: Vec<&str> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["CS101", "MA201"]);

        let res = app.get(&format!("{}?search=CALC", routes::COURSES)).await;
        assert_eq!(res.body.as_array().unwrap().len(), 1);
        assert_eq!(res.body[0]["id"], "MA201");

        let res = app.get(&format!("{}?search=cs1", routes::COURSES)).await;
        assert_eq!(res.body[0]["id"], "CS101");

        let res = app.get(&format!("{}?search=%25", routes::COURSES)).await;
        assert_eq!(res.body.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn duplicate_id_is_a_conflict() {
        let app = TestApp::spawn().await;
        app.create_course("CS101", "Programming").await;

        let res = app
            .post(
                routes::COURSES,
                &json!({ "id": "CS101", "name": "Other", "engname": "Other" }),
            )
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["message"], "Course CS101 already exists");
    }

    #[tokio::test]
    async fn invalid_course_id_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::COURSES,
                &json!({ "id": "CS 101", "name": "x", "engname": "x" }),
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(app.count("course", "").await, 0);
    }

    #[tokio::test]
    async fn update_changes_names() {
        let app = TestApp::spawn().await;
        app.create_course("CS101", "Programming").await;

        let res = app
            .put(
                &routes::course("CS101"),
                &json!({ "name": "Intro", "engname": "Intro (EN)" }),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "Intro");

        let res = app
            .put(&routes::course("NOPE"), &json!({ "name": "x", "engname": "x" }))
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn delete_unreferenced_course() {
        let app = TestApp::spawn().await;
        app.create_course("CS101", "Programming").await;

        let res = app.delete(&routes::course("CS101")).await;
        assert_eq!(res.status, 204);
        assert_eq!(app.count("course", "").await, 0);

        let res = app.delete(&routes::course("CS101")).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn delete_referenced_course_is_a_conflict() {
        let app = TestApp::spawn().await;
        let program = app.create_program("P").await;
        app.create_offering(&Offering::new(&program, "CS101", 2024))
            .await;

        let res = app.delete(&routes::course("CS101")).await;
        assert_eq!(res.status, 409);
        assert_eq!(app.count("course", "").await, 1);
    }
}

mod course_rename {
    use super::*;

    /// Course CS101 with one row in every table that references a course.
    async fn populated(app: &TestApp) -> (Offering, String) {
        let program = app.create_program("P").await;
        let offering = Offering::new(&program, "CS101", 2024);
        app.create_offering(&offering).await;
        let plo = app.create_plo(&program, "PLO1").await;
        let clo = app.create_clo(&offering, "CLO1").await;

        let res = app
            .post(
                &routes::course_plos(&program),
                &json!({ "scores": [{ "course_id": "CS101", "plo_id": plo, "weight": 0.5 }] }),
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);

        app.exec_sql(&format!(
            "INSERT INTO plo_clo (plo_id, clo_id, weight, year, semester_id, section_id, course_id) \
             VALUES ({plo}, {clo}, 1.0, 2024, 1, 1, 'CS101')"
        ))
        .await;
        (offering, clo)
    }

    #[tokio::test]
    async fn moves_every_reference_to_the_new_id() {
        let app = TestApp::spawn().await;
        let (offering, clo) = populated(&app).await;

        let res = app
            .put(
                &routes::course_rename("CS101"),
                &json!({ "new_course_id": "CS201", "name": "Programming", "engname": "Programming" }),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["course_id"], "CS201");
        assert_eq!(res.body["program_course"], 1);
        assert_eq!(res.body["course_plo"], 1);
        assert_eq!(res.body["plo_clo"], 1);
        assert_eq!(res.body["course_clo"], 1);

        assert_eq!(app.count("course", "id = 'CS101'").await, 0);
        assert_eq!(app.count("program_course", "course_id = 'CS101'").await, 0);
        assert_eq!(app.count("program_course", "course_id = 'CS201'").await, 1);

        let res = app
            .get(&format!("{}?clo_ids={clo}", routes::PLO_CLOS))
            .await;
        assert_eq!(res.body[0]["course_id"], "CS201");

        let mut renamed = offering.clone();
        renamed.course_id = "CS201".into();
        let res = app
            .get(&format!("{}?{}", routes::CLOS, renamed.query()))
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn same_id_only_changes_names() {
        let app = TestApp::spawn().await;
        populated(&app).await;

        let res = app
            .put(
                &routes::course_rename("CS101"),
                &json!({ "new_course_id": "CS101", "name": "Intro", "engname": "Intro (EN)" }),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["program_course"], 0);

        let res = app.get(routes::COURSES).await;
        assert_eq!(res.body[0]["name"], "Intro");
        assert_eq!(app.count("program_course", "course_id = 'CS101'").await, 1);
    }

    #[tokio::test]
    async fn existing_target_is_a_conflict() {
        let app = TestApp::spawn().await;
        populated(&app).await;
        app.create_course("CS201", "Taken").await;

        let res = app
            .put(
                &routes::course_rename("CS101"),
                &json!({ "new_course_id": "CS201", "name": "x", "engname": "x" }),
            )
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(app.count("program_course", "course_id = 'CS101'").await, 1);
    }

    #[tokio::test]
    async fn concurrent_renames_of_one_course_apply_once() {
        let app = TestApp::spawn().await;
        populated(&app).await;

        // Keep the first rename open after it inserts the new course row.
        app.exec_sql(
            "CREATE FUNCTION slow_insert() RETURNS trigger AS $$ \
             BEGIN PERFORM pg_sleep(1); RETURN NULL; END; \
             $$ LANGUAGE plpgsql",
        )
        .await;
        app.exec_sql(
            "CREATE TRIGGER course_slow_insert AFTER INSERT ON course \
             FOR EACH ROW EXECUTE FUNCTION slow_insert()",
        )
        .await;

        let rename = |new_id: &str| {
            json!({ "new_course_id": new_id, "name": "Programming", "engname": "Programming" })
        };
        let route = routes::course_rename("CS101");
        let (body_a, body_b) = (rename("CS201"), rename("CS301"));
        let (a, b) = tokio::join!(app.put(&route, &body_a), app.put(&route, &body_b),);

        let mut statuses = vec![a.status, b.status];
        statuses.sort();
        assert_eq!(statuses, vec![200, 404], "{} / {}", a.text, b.text);

        let winner = if a.status == 200 { "CS201" } else { "CS301" };
        assert_eq!(app.count("course", "").await, 1);
        assert_eq!(app.count("course", &format!("id = '{winner}'")).await, 1);
        for table in ["program_course", "course_plo", "plo_clo", "course_clo"] {
            assert_eq!(
                app.count(table, &format!("course_id = '{winner}'")).await,
                1,
                "{table}"
            );
        }
    }

    #[tokio::test]
    async fn missing_course_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .put(
                &routes::course_rename("CS101"),
                &json!({ "new_course_id": "CS201", "name": "x", "engname": "x" }),
            )
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(app.count("course", "").await, 0);
    }

    #[tokio::test]
    async fn failure_midway_leaves_every_table_untouched() {
        let app = TestApp::spawn().await;
        populated(&app).await;

        app.exec_sql(
            "CREATE FUNCTION reject_update() RETURNS trigger AS $$ \
             BEGIN RAISE EXCEPTION 'course_clo is read-only'; END; \
             $$ LANGUAGE plpgsql",
        )
        .await;
        app.exec_sql(
            "CREATE TRIGGER course_clo_read_only BEFORE UPDATE ON course_clo \
             FOR EACH ROW EXECUTE FUNCTION reject_update()",
        )
        .await;

        let res = app
            .put(
                &routes::course_rename("CS101"),
                &json!({ "new_course_id": "CS201", "name": "x", "engname": "x" }),
            )
            .await;
        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"], "INTERNAL_ERROR");

        assert_eq!(app.count("course", "id = 'CS101'").await, 1);
        assert_eq!(app.count("course", "id = 'CS201'").await, 0);
        for table in ["program_course", "course_plo", "plo_clo", "course_clo"] {
            assert_eq!(app.count(table, "course_id = 'CS101'").await, 1, "{table}");
        }
    }
}

mod course_references {
    use super::*;

    #[tokio::test]
    async fn foreign_key_failures_are_classified_by_side() {
        let app = TestApp::spawn().await;
        let program = app.create_program("P").await;
        app.create_offering(&Offering::new(&program, "CS101", 2024))
            .await;

        let err = app
            .db
            .execute_unprepared("DELETE FROM course WHERE id = 'CS101'")
            .await
            .unwrap_err();
        assert_eq!(UpsertError::from(err).kind(), ErrorKind::Conflict);

        let err = app
            .db
            .execute_unprepared(
                "INSERT INTO program_course (program_id, course_id, semester_id, section_id, year) \
                 VALUES (999999, 'CS101', 1, 1, 2025)",
            )
            .await
            .unwrap_err();
        assert_eq!(UpsertError::from(err).kind(), ErrorKind::NotFound);
        assert_eq!(app.count("course", "").await, 1);
    }
}
