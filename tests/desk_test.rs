//! Desk tests: the controller running as its own task, driven through a
//! `DeskHandle` the way the HTTP handlers drive it.

mod common;

use orderdesk::models::order::OrderStatus;
use orderdesk::store::Mutation;
use orderdesk::sync::{CommandError, DeskHandle, Notice, StatusFilter, spawn_desk};
use common::*;

async fn loaded_desk() -> (std::sync::Arc<orderdesk::store::MemoryOrderStore>, DeskHandle) {
    let store = sample_store();
    let desk = spawn_desk(as_dyn(&store));
    let mut views = desk.watch_views();
    within(views.wait_for(|v| v.loaded))
        .await
        .expect("desk publishes views");
    (store, desk)
}

#[tokio::test]
async fn test_desk_publishes_the_first_snapshot() {
    let (_store, desk) = loaded_desk().await;
    let view = desk.view();
    assert_eq!(view.cards.len(), 6);
    assert_eq!(view.stats.pending, 2);
    assert!(view.load_error.is_none());
}

#[tokio::test]
async fn test_set_filter_replies_with_the_filtered_view() {
    let (_store, desk) = loaded_desk().await;

    let view = desk
        .set_filter(Some(StatusFilter::Only(OrderStatus::Ready)), None)
        .await
        .expect("desk running");
    let ids: Vec<&str> = view.cards.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["o3", "o4"]);
    assert_eq!(view.stats.total, 6);

    // Leaving the status alone keeps the earlier choice.
    let view = desk.set_filter(None, Some("biryani".into())).await.expect("desk running");
    assert_eq!(view.cards.len(), 1);
    assert_eq!(view.filter.status, StatusFilter::Only(OrderStatus::Ready));
}

#[tokio::test]
async fn test_advance_updates_the_published_view() {
    let (store, desk) = loaded_desk().await;
    let mut notices = desk.subscribe_notices();
    let mut views = desk.watch_views();

    desk.advance("o1", OrderStatus::Preparing).await.expect("advance accepted");
    assert_eq!(
        within(notices.recv()).await.expect("notice"),
        Notice::success("Order status updated to preparing")
    );
    within(views.wait_for(|v| v.stats.preparing == 2))
        .await
        .expect("desk publishes views");
    assert_eq!(store.mutations().len(), 1);
}

#[tokio::test]
async fn test_rejected_advance_reaches_no_store() {
    let (store, desk) = loaded_desk().await;

    let result = desk.advance("o6", OrderStatus::Preparing).await;
    assert!(matches!(result, Err(CommandError::InvalidTransition { .. })));
    assert!(store.mutations().is_empty());
}

#[tokio::test]
async fn test_two_phase_delete_through_the_handle() {
    let (store, desk) = loaded_desk().await;

    let staged = desk.request_delete("o3").await.expect("order is cached");
    assert_eq!(staged.order_number, "1003");
    assert_eq!(desk.view().staged_delete, Some(staged));
    assert!(store.mutations().is_empty());

    desk.confirm_delete().await.expect("delete sent");
    assert_eq!(store.mutations(), vec![Mutation::Delete { order_id: "o3".into() }]);

    let mut views = desk.watch_views();
    within(views.wait_for(|v| v.stats.total == 5 && v.staged_delete.is_none()))
        .await
        .expect("desk publishes views");

    assert!(matches!(desk.confirm_delete().await, Err(CommandError::NothingStaged)));
}

#[tokio::test]
async fn test_cancel_delete_through_the_handle() {
    let (store, desk) = loaded_desk().await;

    desk.request_delete("o4").await.expect("order is cached");
    desk.cancel_delete().await.expect("desk running");

    let mut views = desk.watch_views();
    within(views.wait_for(|v| v.staged_delete.is_none()))
        .await
        .expect("desk publishes views");
    assert!(store.mutations().is_empty());
}

#[tokio::test]
async fn test_export_through_the_handle() {
    let (_store, desk) = loaded_desk().await;

    desk.set_filter(Some(StatusFilter::Only(OrderStatus::Completed)), None)
        .await
        .expect("desk running");
    let csv = desk.export().await.expect("export succeeds");
    assert_eq!(csv.body.lines().count(), 2);
}

#[tokio::test]
async fn test_stopped_desk_reports_closed() {
    let (_store, desk) = loaded_desk().await;

    desk.stop().await;
    within(async {
        while !desk.is_closed() {
            tokio::task::yield_now().await;
        }
    })
    .await;

    assert!(matches!(desk.refresh().await, Err(CommandError::DeskClosed)));
    assert!(matches!(desk.export().await, Err(CommandError::DeskClosed)));
}
