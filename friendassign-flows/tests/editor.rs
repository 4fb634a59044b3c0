mod common;

use chrono::NaiveDate;
use common::World;
use friendassign_api::assignment::{AssignmentId, Difficulty};
use friendassign_api::testing::assignment_json;
use friendassign_flows::editor::{AssignmentEditor, EditorMode};
use friendassign_flows::notice::{NoticeKind, Route, TOAST_DURATION};
use friendassign_flows::validation::Field;
use reqwest::{Method, StatusCode};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn invalid_form_never_reaches_the_server() {
    let world = World::new();
    let session = world.sign_in("ana@x.com");
    let mut editor = AssignmentEditor::create(world.client(), session).with_today(date("2026-03-01"));
    editor.form_mut().title = "Tiny".to_owned();

    let outcome = editor.save().await;

    let notice = outcome.notice().unwrap();
    assert_eq!(notice.kind(), NoticeKind::ValidationError);
    let fields: Vec<Field> = notice.field_errors().iter().map(|e| e.field()).collect();
    assert_eq!(
        fields,
        [Field::Title, Field::Description, Field::Marks, Field::ThumbnailUrl]
    );
    assert_eq!(outcome.route(), None);
    assert!(world.backend.requests().is_empty());
}

#[tokio::test]
async fn signed_out_creation_reports_the_missing_owner() {
    let world = World::new();
    let mut editor = AssignmentEditor::create(world.client(), world.session())
        .with_today(date("2026-03-01"));
    let form = editor.form_mut();
    form.title = "Closures".to_owned();
    form.description = "Write three closures that capture by move.".to_owned();
    form.marks = "10".to_owned();
    form.thumbnail_url = "https://img.example.com/c.png".to_owned();

    let outcome = editor.save().await;

    let fields: Vec<Field> = outcome
        .notice()
        .unwrap()
        .field_errors()
        .iter()
        .map(|e| e.field())
        .collect();
    assert_eq!(fields, [Field::Owner]);
    assert!(world.backend.requests().is_empty());
}

#[tokio::test]
async fn valid_creation_posts_and_returns_to_the_list() {
    let world = World::new();
    let session = world.sign_in("ana@x.com");
    let mut editor = AssignmentEditor::create(world.client(), session).with_today(date("2026-03-01"));
    let form = editor.form_mut();
    form.title = "Closures".to_owned();
    form.description = "Write three closures that capture by move.".to_owned();
    form.marks = "25".to_owned();
    form.thumbnail_url = "https://img.example.com/c.png".to_owned();
    form.difficulty = Difficulty::Hard;
    form.due_date = date("2026-03-15");

    let outcome = editor.save().await;

    let notice = outcome.notice().unwrap();
    assert_eq!(notice.kind(), NoticeKind::Success);
    assert_eq!(notice.auto_dismiss(), Some(TOAST_DURATION));
    assert_eq!(outcome.route(), Some(&Route::Assignments));
    assert!(editor.form().title.is_empty());
    assert_eq!(world.backend.assignment_count(), 1);

    let posts = world.requests_with("POST");
    assert_eq!(
        posts[0].json(),
        Some(&serde_json::json!({
            "title": "Closures",
            "description": "Write three closures that capture by move.",
            "marks": 25,
            "thumbnailUrl": "https://img.example.com/c.png",
            "difficulty": "Hard",
            "dueDate": "2026-03-15T00:00:00.000Z",
            "userEmail": "ana@x.com",
            "userName": "ana",
        }))
    );
}

#[tokio::test]
async fn past_due_date_blocks_creation() {
    let world = World::new();
    let session = world.sign_in("ana@x.com");
    let mut editor = AssignmentEditor::create(world.client(), session).with_today(date("2026-03-01"));
    let form = editor.form_mut();
    form.title = "Closures".to_owned();
    form.description = "Write three closures that capture by move.".to_owned();
    form.marks = "25".to_owned();
    form.thumbnail_url = "https://img.example.com/c.png".to_owned();
    form.due_date = date("2026-02-28");

    let outcome = editor.save().await;

    assert_eq!(outcome.kind(), Some(NoticeKind::ValidationError));
    assert!(world.backend.requests().is_empty());
}

#[tokio::test]
async fn only_the_owner_may_open_the_update_form() {
    let world = World::new();
    world
        .backend
        .insert_assignment(assignment_json("a1", "Generics drill", "Easy", 10, "ana@x.com"));
    let id = AssignmentId::from("a1");

    let Err(outcome) = AssignmentEditor::load_for_edit(world.client(), world.session(), &id).await
    else {
        panic!("signed-out user opened the update form");
    };
    assert_eq!(outcome.kind(), Some(NoticeKind::LoginRequired));
    assert_eq!(outcome.route(), Some(&Route::Login));

    let intruder = world.sign_in("ben@x.com");
    let Err(outcome) = AssignmentEditor::load_for_edit(world.client(), intruder, &id).await else {
        panic!("non-owner opened the update form");
    };
    assert_eq!(outcome.kind(), Some(NoticeKind::Unauthorized));
    assert_eq!(outcome.route(), Some(&Route::Assignments));
    assert!(world.requests_with("PUT").is_empty());
}

#[tokio::test]
async fn owner_updates_with_a_prefilled_form() {
    let world = World::new();
    world
        .backend
        .insert_assignment(assignment_json("a1", "Generics drill", "Easy", 10, "ana@x.com"));
    let session = world.sign_in("ana@x.com");
    let id = AssignmentId::from("a1");

    let mut editor = AssignmentEditor::load_for_edit(world.client(), session, &id)
        .await
        .unwrap();
    assert_eq!(editor.mode(), &EditorMode::Update(id.clone()));
    assert_eq!(editor.form().title, "Generics drill");
    assert_eq!(editor.form().marks, "10");
    assert_eq!(editor.form().due_date, date("2030-01-01"));

    editor.form_mut().marks = "15".to_owned();
    let outcome = editor.save().await;

    assert_eq!(outcome.kind(), Some(NoticeKind::Success));
    assert_eq!(outcome.notice().unwrap().text(), "Assignment updated!");
    assert_eq!(outcome.route(), Some(&Route::Assignments));
    assert_eq!(world.backend.assignment("a1").unwrap()["marks"], 15);
}

#[tokio::test]
async fn refused_update_shows_the_server_message() {
    let world = World::new();
    world
        .backend
        .insert_assignment(assignment_json("a1", "Generics drill", "Easy", 10, "ana@x.com"));
    let session = world.sign_in("ana@x.com");
    let id = AssignmentId::from("a1");
    let mut editor = AssignmentEditor::load_for_edit(world.client(), session, &id)
        .await
        .unwrap();
    world.backend.fail(
        Method::PUT,
        "/api/assignments/a1",
        StatusCode::FORBIDDEN,
        "You can only update your own assignments",
    );

    let outcome = editor.save().await;

    assert_eq!(outcome.kind(), Some(NoticeKind::Error));
    assert_eq!(
        outcome.notice().unwrap().text(),
        "You can only update your own assignments"
    );
    assert_eq!(outcome.route(), None);
    assert!(!editor.is_saving());
}

#[tokio::test]
async fn acknowledged_create_and_update_both_succeed() {
    let world = World::new();
    world.backend.acknowledge_writes();
    let session = world.sign_in("ana@x.com");

    let mut creator =
        AssignmentEditor::create(world.client(), session.clone()).with_today(date("2026-03-01"));
    let form = creator.form_mut();
    form.title = "Closures".to_owned();
    form.description = "Write three closures that capture by move.".to_owned();
    form.marks = "25".to_owned();
    form.thumbnail_url = "https://img.example.com/c.png".to_owned();
    form.due_date = date("2026-03-15");
    let created = creator.save().await;
    assert_eq!(created.kind(), Some(NoticeKind::Success));
    assert_eq!(created.route(), Some(&Route::Assignments));

    world
        .backend
        .insert_assignment(assignment_json("a1", "Generics drill", "Easy", 10, "ana@x.com"));
    let Ok(mut updater) =
        AssignmentEditor::load_for_edit(world.client(), session, &AssignmentId::from("a1")).await
    else {
        panic!("owner could not open the update form");
    };
    updater.form_mut().marks = "15".to_owned();
    let updated = updater.save().await;
    assert_eq!(updated.kind(), Some(NoticeKind::Success));
    assert_eq!(world.backend.assignment("a1").unwrap()["marks"], 15);
}
