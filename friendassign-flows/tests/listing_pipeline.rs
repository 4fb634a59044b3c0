mod common;

use std::time::Duration;

use common::World;
use friendassign_api::assignment::Difficulty;
use friendassign_api::testing::assignment_json;
use friendassign_flows::debounce::DEBOUNCE_DELAY;
use friendassign_flows::listing::pipeline::ListingPipeline;
use friendassign_flows::listing::sort::{Sort, SortDirection, SortField};
use friendassign_flows::listing::{LOAD_FAILED_MESSAGE, Listing, ListingView};
use friendassign_flows::notice::NoticeKind;
use reqwest::{Method, StatusCode};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

fn seeded_world() -> World {
    let world = World::new();
    for (id, title, difficulty, marks) in [
        ("1", "Rust ownership", "Easy", 10),
        ("2", "Python basics", "Easy", 5),
        ("3", "Trusting the borrow checker", "Hard", 30),
        ("4", "SQL joins", "Medium", 15),
    ] {
        world
            .backend
            .insert_assignment(assignment_json(id, title, difficulty, marks, "a@x.com"));
    }
    world
}

fn searches(world: &World) -> Vec<String> {
    world
        .requests_with("GET")
        .iter()
        .map(|request| request.query_value("search").unwrap_or_default().to_owned())
        .collect()
}

fn titles(view: &ListingView) -> Vec<String> {
    view.items.iter().map(|a| a.title().to_string()).collect()
}

async fn settle() {
    sleep(DEBOUNCE_DELAY + Duration::from_millis(100)).await;
}

#[tokio::test(start_paused = true)]
async fn initial_fetch_fills_the_view() {
    let world = seeded_world();
    let cancel = CancellationToken::new();
    let pipeline = ListingPipeline::spawn(world.client(), Listing::default(), &cancel);

    settle().await;

    let view = pipeline.view();
    assert!(!view.loading);
    assert_eq!(view.items.len(), 4);
    assert_eq!(searches(&world), [""]);
    pipeline.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn burst_of_keystrokes_sends_one_search() {
    let world = seeded_world();
    let cancel = CancellationToken::new();
    let pipeline = ListingPipeline::spawn(world.client(), Listing::default(), &cancel);
    settle().await;

    for partial in ["r", "ru", "rus", "rust"] {
        pipeline.set_search(partial);
        sleep(Duration::from_millis(100)).await;
    }
    settle().await;

    assert_eq!(searches(&world), ["", "rust"]);
    assert_eq!(
        titles(&pipeline.view()),
        ["Rust ownership", "Trusting the borrow checker"]
    );
    pipeline.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn typing_back_to_the_same_text_sends_nothing() {
    let world = seeded_world();
    let cancel = CancellationToken::new();
    let pipeline = ListingPipeline::spawn(world.client(), Listing::default(), &cancel);
    settle().await;

    pipeline.set_search("p");
    sleep(Duration::from_millis(100)).await;
    pipeline.set_search("");
    settle().await;

    assert_eq!(searches(&world), [""]);
    pipeline.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn slow_stale_response_never_replaces_a_newer_one() {
    let world = seeded_world();
    world.backend.delay_search("", Duration::from_secs(2));
    let cancel = CancellationToken::new();
    let pipeline = ListingPipeline::spawn(world.client(), Listing::default(), &cancel);

    pipeline.set_search("python");
    settle().await;
    assert_eq!(titles(&pipeline.view()), ["Python basics"]);

    sleep(Duration::from_secs(3)).await;

    let view = pipeline.view();
    assert_eq!(titles(&view), ["Python basics"]);
    assert!(!view.loading);
    assert_eq!(searches(&world), ["", "python"]);
    pipeline.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn search_set_right_after_spawning_is_fetched() {
    let world = seeded_world();
    let cancel = CancellationToken::new();
    let pipeline = ListingPipeline::spawn(world.client(), Listing::default(), &cancel);

    pipeline.set_search("python");
    sleep(Duration::from_secs(5)).await;

    assert_eq!(titles(&pipeline.view()), ["Python basics"]);
    assert_eq!(searches(&world), ["", "python"]);
    pipeline.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn difficulty_applies_without_waiting_for_the_debounce() {
    let world = seeded_world();
    let cancel = CancellationToken::new();
    let pipeline = ListingPipeline::spawn(world.client(), Listing::default(), &cancel);
    settle().await;

    pipeline.set_difficulty(Some(Difficulty::Hard));
    sleep(Duration::from_millis(1)).await;

    let gets = world.requests_with("GET");
    assert_eq!(gets.len(), 2);
    assert_eq!(gets[1].query_value("difficulty"), Some("Hard"));
    assert_eq!(titles(&pipeline.view()), ["Trusting the borrow checker"]);
    pipeline.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn sort_and_page_changes_are_local() {
    let world = seeded_world();
    let cancel = CancellationToken::new();
    let pipeline = ListingPipeline::spawn(world.client(), Listing::default(), &cancel);
    settle().await;

    pipeline.set_sort(Sort::by(SortField::Marks, SortDirection::Descending));
    sleep(Duration::from_millis(1)).await;

    assert_eq!(
        titles(&pipeline.view()),
        [
            "Trusting the borrow checker",
            "SQL joins",
            "Rust ownership",
            "Python basics"
        ]
    );
    assert_eq!(world.requests_with("GET").len(), 1);
    pipeline.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn failed_fetch_raises_a_notice_and_empties_the_list() {
    let world = seeded_world();
    world.backend.fail(
        Method::GET,
        "/api/assignments",
        StatusCode::INTERNAL_SERVER_ERROR,
        "boom",
    );
    let cancel = CancellationToken::new();
    let mut pipeline = ListingPipeline::spawn(world.client(), Listing::default(), &cancel);

    let notice = pipeline.next_notice().await.unwrap();
    assert_eq!(notice.kind(), NoticeKind::Error);
    assert_eq!(notice.text(), LOAD_FAILED_MESSAGE);

    sleep(Duration::from_millis(1)).await;
    let view = pipeline.view();
    assert!(view.is_empty);
    assert!(!view.loading);
    assert_eq!(view.empty_message(), Some("No assignments found."));
    pipeline.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn cancelled_pipeline_stops_fetching() {
    let world = seeded_world();
    world.backend.delay_search("", Duration::from_secs(2));
    let cancel = CancellationToken::new();
    let pipeline = ListingPipeline::spawn(world.client(), Listing::default(), &cancel);
    sleep(Duration::from_millis(1)).await;

    cancel.cancel();
    pipeline.set_difficulty(Some(Difficulty::Easy));
    pipeline.set_search("rust");
    sleep(Duration::from_secs(3)).await;

    assert_eq!(world.backend.requests().len(), 1);
    assert!(pipeline.view().items.is_empty());
    pipeline.shutdown().await;
}
