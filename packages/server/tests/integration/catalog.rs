use crate::common::{Offering, TestApp, routes};

#[tokio::test]
async fn default_semesters_are_seeded() {
    let app = TestApp::spawn().await;

    let res = app.get(routes::SEMESTERS).await;
    assert_eq!(res.status, 200);
    let ids: Vec<i64> = res
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(res.body[0]["name"], "First");
}

#[tokio::test]
async fn sections_appear_once_offerings_use_them() {
    let app = TestApp::spawn().await;

    let res = app.get(routes::SECTIONS).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body.as_array().unwrap().len(), 0);

    let program = app.create_program("P").await;
    let mut offering = Offering::new(&program, "CS101", 2024);
    offering.section_id = 3;
    app.create_offering(&offering).await;
    offering.section_id = 1;
    app.create_offering(&offering).await;

    let res = app.get(routes::SECTIONS).await;
    let ids: Vec<i64> = res
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 3]);
}
