use crate::common::{Offering, TestApp, routes};
use server::config::CurriculumConfig;
use serde_json::{Value, json};

fn clo_row(offering: &Offering, code: &str) -> Value {
    offering.body_with(json!({ "code": code, "name": format!("{code} name"), "engname": "en" }))
}

mod offering_import {
    use super::*;

    #[tokio::test]
    async fn imports_every_row() {
        let app = TestApp::spawn().await;
        let program = app.create_program("P").await;
        let rows: Vec<Value> = ["CS101", "CS102", "CS103"]
            .iter()
            .map(|c| Offering::new(&program, c, 2024).body())
            .collect();

        let res = app
            .post(routes::OFFERINGS_IMPORT, &json!({ "rows": rows }))
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["imported"], 3);
        assert_eq!(app.count("program_course", "").await, 3);
        assert_eq!(app.count("course", "").await, 3);
        // The section is created by the first row only.
        assert_eq!(app.count("section", "").await, 1);
    }

    #[tokio::test]
    async fn one_failing_row_commits_nothing() {
        let app = TestApp::spawn().await;
        let program = app.create_program("P").await;
        let mut bad = Offering::new(&program, "CS102", 2024);
        bad.semester_id = 9;
        let rows = vec![
            Offering::new(&program, "CS101", 2024).body(),
            bad.body(),
            Offering::new(&program, "CS103", 2024).body(),
        ];

        let res = app
            .post(routes::OFFERINGS_IMPORT, &json!({ "rows": rows }))
            .await;
        assert_eq!(res.status, 404);
        assert!(
            res.body["message"].as_str().unwrap().starts_with("Row 2:"),
            "{}",
            res.text
        );
        assert_eq!(app.count("program_course", "").await, 0);
        assert_eq!(app.count("course", "").await, 0);
        assert_eq!(app.count("section", "").await, 0);
    }

    #[tokio::test]
    async fn duplicate_rows_conflict() {
        let app = TestApp::spawn().await;
        let program = app.create_program("P").await;
        let row = Offering::new(&program, "CS101", 2024).body();

        let res = app
            .post(routes::OFFERINGS_IMPORT, &json!({ "rows": [row.clone(), row] }))
            .await;
        assert_eq!(res.status, 409);
        assert!(res.body["message"].as_str().unwrap().starts_with("Row 2:"));
        assert_eq!(app.count("program_course", "").await, 0);
    }

    #[tokio::test]
    async fn invalid_row_is_named_before_any_write() {
        let app = TestApp::spawn().await;
        let program = app.create_program("P").await;
        let mut bad = Offering::new(&program, "CS102", 2024);
        bad.course_id = " ".into();
        let rows = vec![
            Offering::new(&program, "CS101", 2024).body(),
            Offering::new(&program, "CS103", 2024).body(),
            bad.body(),
        ];

        let res = app
            .post(routes::OFFERINGS_IMPORT, &json!({ "rows": rows }))
            .await;
        assert_eq!(res.status, 400);
        assert!(res.body["message"].as_str().unwrap().starts_with("Row 3:"));
        assert_eq!(app.count("course", "").await, 0);
    }

    #[tokio::test]
    async fn row_limit_is_enforced() {
        let app = TestApp::spawn_with(CurriculumConfig {
            max_import_rows: 2,
            ..Default::default()
        })
        .await;
        let program = app.create_program("P").await;
        let rows: Vec<Value> = ["CS101", "CS102", "CS103"]
            .iter()
            .map(|c| Offering::new(&program, c, 2024).body())
            .collect();

        let res = app
            .post(routes::OFFERINGS_IMPORT, &json!({ "rows": rows }))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(app.count("program_course", "").await, 0);

        let res = app
            .post(routes::OFFERINGS_IMPORT, &json!({ "rows": [] }))
            .await;
        assert_eq!(res.status, 400);
    }
}

mod clo_import {
    use super::*;

    #[tokio::test]
    async fn imports_clos_for_existing_offerings() {
        let app = TestApp::spawn().await;
        let program = app.create_program("P").await;
        let offering = Offering::new(&program, "CS101", 2024);
        app.create_offering(&offering).await;

        let res = app
            .post(
                routes::CLOS_IMPORT,
                &json!({ "rows": [clo_row(&offering, "CLO1"), clo_row(&offering, "CLO2")] }),
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["imported"], 2);
        assert_eq!(app.count("clo", "").await, 2);
        assert_eq!(app.count("course_clo", "").await, 2);
    }

    #[tokio::test]
    async fn missing_offering_rolls_back_the_batch() {
        let app = TestApp::spawn().await;
        let program = app.create_program("P").await;
        let offering = Offering::new(&program, "CS101", 2024);
        app.create_offering(&offering).await;
        let mut missing = offering.clone();
        missing.year = 2099;

        let res = app
            .post(
                routes::CLOS_IMPORT,
                &json!({ "rows": [clo_row(&offering, "CLO1"), clo_row(&missing, "CLO2")] }),
            )
            .await;
        assert_eq!(res.status, 404);
        assert!(res.body["message"].as_str().unwrap().starts_with("Row 2:"));
        assert_eq!(app.count("clo", "").await, 0);
        assert_eq!(app.count("course_clo", "").await, 0);
    }
}

mod plo_import {
    use super::*;

    fn plo_row(program: &str, code: &str) -> Value {
        json!({ "program_id": program, "code": code, "name": "n", "engname": "e" })
    }

    #[tokio::test]
    async fn imports_plos_into_a_program() {
        let app = TestApp::spawn().await;
        let program = app.create_program("P").await;

        let res = app
            .post(
                routes::PLOS_IMPORT,
                &json!({ "rows": [plo_row(&program, "PLO1"), plo_row(&program, "PLO2")] }),
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["imported"], 2);
        assert_eq!(app.count("program_plo", "").await, 2);

        let res = app.get(&routes::program_plos(&program)).await;
        assert_eq!(res.body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn blank_field_names_the_row() {
        let app = TestApp::spawn().await;
        let program = app.create_program("P").await;

        let res = app
            .post(
                routes::PLOS_IMPORT,
                &json!({ "rows": [plo_row(&program, "PLO1"), plo_row(&program, "")] }),
            )
            .await;
        assert_eq!(res.status, 400);
        assert!(res.body["message"].as_str().unwrap().starts_with("Row 2:"));
        assert_eq!(app.count("plo", "").await, 0);
    }

    #[tokio::test]
    async fn unknown_program_rolls_back_the_batch() {
        let app = TestApp::spawn().await;
        let program = app.create_program("P").await;

        let res = app
            .post(
                routes::PLOS_IMPORT,
                &json!({ "rows": [plo_row(&program, "PLO1"), plo_row("999999", "PLO2")] }),
            )
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(app.count("plo", "").await, 0);
        assert_eq!(app.count("program_plo", "").await, 0);
    }
}
