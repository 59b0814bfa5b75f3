use crate::common::{Offering, TestApp, routes};
use serde_json::json;

mod program_crud {
    use super::*;

    #[tokio::test]
    async fn creates_and_fetches_a_program() {
        let app = TestApp::spawn().await;

        let res = app
            .post(routes::PROGRAMS, &json!({ "name": "  Computer Engineering " }))
            .await;
        assert_eq!(res.status, 201);
        assert_eq!(res.body["name"], "Computer Engineering");
        let id = res.id();

        let res = app.get(&routes::program(&id)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["id"], id.as_str());
    }

    #[tokio::test]
    async fn rejects_blank_name() {
        let app = TestApp::spawn().await;

        let res = app.post(routes::PROGRAMS, &json!({ "name": "   " })).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn rejects_missing_fields() {
        let app = TestApp::spawn().await;

        let res = app.post(routes::PROGRAMS, &json!({})).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn lists_programs_in_id_order() {
        let app = TestApp::spawn().await;
        let a = app.create_program("A").await;
        let b = app.create_program("B").await;

        let res = app.get(routes::PROGRAMS).await;
        assert_eq!(res.status, 200);
        let ids: Vec<&str> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec![a.as_str(), b.as_str()]);
    }

    #[tokio::test]
    async fn renames_a_program() {
        let app = TestApp::spawn().await;
        let id = app.create_program("Old").await;

        let res = app
            .put(&routes::program(&id), &json!({ "name": "New" }))
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["name"], "New");
    }

    #[tokio::test]
    async fn returns_not_found_for_missing_program() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::program("999")).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");

        let res = app
            .put(&routes::program("999"), &json!({ "name": "x" }))
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn delete_removes_program_and_plo_links() {
        let app = TestApp::spawn().await;
        let id = app.create_program("P").await;
        app.create_plo(&id, "PLO1").await;

        let res = app.delete(&routes::program(&id)).await;
        assert_eq!(res.status, 204);
        assert_eq!(app.count("program_plo", "").await, 0);
        assert_eq!(app.get(&routes::program(&id)).await.status, 404);
        // The PLO itself survives.
        assert_eq!(app.count("plo", "").await, 1);
    }

    #[tokio::test]
    async fn delete_refuses_program_with_offerings() {
        let app = TestApp::spawn().await;
        let id = app.create_program("P").await;
        app.create_offering(&Offering::new(&id, "CS101", 2024)).await;

        let res = app.delete(&routes::program(&id)).await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
        assert_eq!(app.get(&routes::program(&id)).await.status, 200);
    }
}

mod wide_ids {
    use super::*;

    #[tokio::test]
    async fn ids_beyond_two_pow_53_round_trip_as_strings() {
        let app = TestApp::spawn().await;
        app.exec_sql(
            "SELECT setval(pg_get_serial_sequence('program', 'id'), 9007199254740993)",
        )
        .await;

        let id = app.create_program("Big").await;
        assert_eq!(id, "9007199254740994");

        let res = app.get(&routes::program(&id)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["id"], "9007199254740994");

        // The same id given as a JSON string in a body resolves the same row.
        let res = app
            .post(
                routes::PLOS,
                &json!({
                    "program_id": "9007199254740994",
                    "code": "PLO1",
                    "name": "n",
                    "engname": "e",
                }),
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(
            app.count("program_plo", "program_id = 9007199254740994")
                .await,
            1
        );
    }

    #[tokio::test]
    async fn small_ids_are_strings_too() {
        let app = TestApp::spawn().await;
        let res = app.post(routes::PROGRAMS, &json!({ "name": "P" })).await;
        assert!(res.body["id"].is_string());
    }
}

mod program_plos {
    use super::*;

    #[tokio::test]
    async fn creating_a_plo_links_it_to_the_program() {
        let app = TestApp::spawn().await;
        let program = app.create_program("P").await;
        let plo = app.create_plo(&program, "PLO1").await;

        let res = app.get(&routes::program_plos(&program)).await;
        assert_eq!(res.status, 200);
        let items = res.body.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"], plo.as_str());
        assert_eq!(items[0]["code"], "PLO1");
    }

    #[tokio::test]
    async fn creating_a_plo_for_missing_program_creates_nothing() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::PLOS,
                &json!({ "program_id": "42", "code": "PLO1", "name": "n", "engname": "e" }),
            )
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(app.count("plo", "").await, 0);
    }

    #[tokio::test]
    async fn links_existing_plos_to_another_program() {
        let app = TestApp::spawn().await;
        let a = app.create_program("A").await;
        let b = app.create_program("B").await;
        let plo1 = app.create_plo(&a, "PLO1").await;
        let plo2 = app.create_plo(&a, "PLO2").await;

        let res = app
            .post(&routes::program_plos(&b), &json!({ "plo_ids": [plo1, plo2] }))
            .await;
        assert_eq!(res.status, 204, "{}", res.text);

        let res = app.get(&routes::program_plos(&b)).await;
        assert_eq!(res.body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn linking_with_one_missing_plo_links_nothing() {
        let app = TestApp::spawn().await;
        let a = app.create_program("A").await;
        let b = app.create_program("B").await;
        let plo = app.create_plo(&a, "PLO1").await;

        let res = app
            .post(&routes::program_plos(&b), &json!({ "plo_ids": [plo, "777"] }))
            .await;
        assert_eq!(res.status, 404);
        assert!(res.body["message"].as_str().unwrap().starts_with("Row 2:"));
        assert_eq!(app.count("program_plo", &format!("program_id = {b}")).await, 0);
    }

    #[tokio::test]
    async fn linking_twice_conflicts() {
        let app = TestApp::spawn().await;
        let a = app.create_program("A").await;
        let plo = app.create_plo(&a, "PLO1").await;

        let res = app
            .post(&routes::program_plos(&a), &json!({ "plo_ids": [plo] }))
            .await;
        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn updates_plo_text_through_program() {
        let app = TestApp::spawn().await;
        let program = app.create_program("P").await;
        let plo = app.create_plo(&program, "PLO1").await;

        let res = app
            .put(
                &routes::program_plo(&program, &plo),
                &json!({ "name": "Design", "engname": "Design (EN)" }),
            )
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["name"], "Design");
        assert_eq!(res.body["code"], "PLO1");
    }

    #[tokio::test]
    async fn update_requires_link() {
        let app = TestApp::spawn().await;
        let a = app.create_program("A").await;
        let b = app.create_program("B").await;
        let plo = app.create_plo(&a, "PLO1").await;

        let res = app
            .put(
                &routes::program_plo(&b, &plo),
                &json!({ "name": "x", "engname": "y" }),
            )
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn unlinks_a_plo() {
        let app = TestApp::spawn().await;
        let program = app.create_program("P").await;
        let plo = app.create_plo(&program, "PLO1").await;

        let res = app.delete(&routes::program_plo(&program, &plo)).await;
        assert_eq!(res.status, 204);

        let res = app.delete(&routes::program_plo(&program, &plo)).await;
        assert_eq!(res.status, 404);
    }
}

mod program_reports {
    use super::*;

    #[tokio::test]
    async fn lists_offerings_with_names() {
        let app = TestApp::spawn().await;
        let program = app.create_program("Computer Engineering").await;
        app.create_course("CS101", "Programming").await;
        app.create_offering(&Offering::new(&program, "CS101", 2024))
            .await;

        let res = app.get(&routes::program_offerings(&program)).await;
        assert_eq!(res.status, 200);
        let items = res.body.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["program_name"], "Computer Engineering");
        assert_eq!(items[0]["course_name"], "Programming");
        assert_eq!(items[0]["semester_name"], "First");
        assert_eq!(items[0]["year"], 2024);
    }

    #[tokio::test]
    async fn lists_distinct_years_ascending() {
        let app = TestApp::spawn().await;
        let program = app.create_program("P").await;
        app.create_offering(&Offering::new(&program, "CS101", 2025))
            .await;
        app.create_offering(&Offering::new(&program, "CS102", 2023))
            .await;
        app.create_offering(&Offering::new(&program, "CS103", 2025))
            .await;

        let res = app.get(&routes::program_years(&program)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body, json!([2023, 2025]));
    }
}
