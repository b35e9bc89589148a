//! Anonymous-session cart flows: optimistic mutation, identity-key merging,
//! quantity floor, and count broadcast consistency.

mod support;

use support::harness;
use trolley::domain::{LineKey, ProductId};
use trolley::testkit::domain::{new_line, new_line_without_variant};

fn key(product: u64, color: &str, size: &str) -> LineKey {
    LineKey::new(ProductId::new(product), color, size)
}

#[tokio::test]
async fn two_adds_with_same_key_merge_into_one_line() {
    let h = harness();
    h.auth.resolve(false);
    h.store.initialize().await;

    h.store.add_to_cart(new_line(1, "black", "M", 1)).await;
    h.store.add_to_cart(new_line(1, "black", "M", 2)).await;

    let snapshot = h.store.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.lines()[0].quantity, 3);
}

#[tokio::test]
async fn adds_with_distinct_keys_stay_separate() {
    let h = harness();
    h.auth.resolve(false);
    h.store.initialize().await;

    h.store.add_to_cart(new_line(1, "black", "M", 1)).await;
    h.store.add_to_cart(new_line(1, "white", "M", 1)).await;
    h.store.add_to_cart(new_line(2, "black", "M", 1)).await;

    assert_eq!(h.store.snapshot().len(), 3);
    assert_eq!(h.store.total_items(), 3);
}

#[tokio::test]
async fn adds_are_persisted_to_the_anonymous_store() {
    let h = harness();
    h.auth.resolve(false);
    h.store.initialize().await;

    h.store.add_to_cart(new_line(1, "black", "M", 2)).await;

    let persisted = h.anonymous.read().await;
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].quantity, 2);
}

#[tokio::test]
async fn remove_filters_by_identity_key() {
    let h = harness();
    h.auth.resolve(false);
    h.store.initialize().await;

    h.store.add_to_cart(new_line(1, "black", "M", 2)).await;
    h.store.add_to_cart(new_line(1, "black", "L", 1)).await;

    h.store.remove_from_cart(&key(1, "black", "M")).await;

    let snapshot = h.store.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.lines()[0].size, "L");
    assert_eq!(h.anonymous.read().await.len(), 1);
}

#[tokio::test]
async fn update_quantity_persists_immediately_when_anonymous() {
    let h = harness();
    h.auth.resolve(false);
    h.store.initialize().await;

    h.store.add_to_cart(new_line(1, "black", "M", 1)).await;
    h.store
        .update_quantity(&key(1, "black", "M"), 4)
        .await
        .unwrap();

    assert_eq!(h.store.total_items(), 4);
    assert_eq!(h.anonymous.read().await[0].quantity, 4);
    // No remote traffic for an anonymous session.
    assert!(h.remote.update_calls().is_empty());
}

#[tokio::test]
async fn update_quantity_zero_removes_the_line() {
    let h = harness();
    h.auth.resolve(false);
    h.store.initialize().await;

    h.store.add_to_cart(new_line(1, "black", "M", 3)).await;
    h.store
        .update_quantity(&key(1, "black", "M"), 0)
        .await
        .unwrap();

    assert!(h.store.snapshot().is_empty());
    assert!(h.anonymous.read().await.is_empty());
}

#[tokio::test]
async fn update_quantity_negative_removes_the_line() {
    let h = harness();
    h.auth.resolve(false);
    h.store.initialize().await;

    h.store.add_to_cart(new_line(1, "black", "M", 3)).await;
    h.store
        .update_quantity(&key(1, "black", "M"), -2)
        .await
        .unwrap();

    assert!(h.store.snapshot().is_empty());
}

#[tokio::test]
async fn update_quantity_for_unknown_line_is_a_no_op() {
    let h = harness();
    h.auth.resolve(false);
    h.store.initialize().await;

    h.store
        .update_quantity(&key(9, "green", "XL"), 3)
        .await
        .unwrap();

    assert!(h.store.snapshot().is_empty());
}

#[tokio::test]
async fn clear_cart_wipes_memory_and_anonymous_store() {
    let h = harness();
    h.auth.resolve(false);
    h.store.initialize().await;

    h.store.add_to_cart(new_line(1, "black", "M", 2)).await;
    h.store.add_to_cart(new_line(2, "red", "S", 1)).await;

    h.store.clear_cart().await;

    assert!(h.store.snapshot().is_empty());
    assert!(h.anonymous.read().await.is_empty());
    assert_eq!(h.store.last_published_count(), 0);
}

#[tokio::test]
async fn every_mutation_broadcasts_the_current_total() {
    let h = harness();
    h.auth.resolve(false);
    h.store.initialize().await;

    let mut rx = h.store.subscribe_count();

    h.store.add_to_cart(new_line(1, "black", "M", 2)).await;
    h.store.add_to_cart(new_line(2, "red", "S", 1)).await;
    h.store
        .update_quantity(&key(1, "black", "M"), 5)
        .await
        .unwrap();
    h.store.remove_from_cart(&key(2, "red", "S")).await;

    let mut last = 0;
    while let Ok(update) = rx.try_recv() {
        last = update.count;
    }
    assert_eq!(last, h.store.total_items());
    assert_eq!(h.store.last_published_count(), h.store.total_items());
}

#[tokio::test]
async fn anonymous_lines_do_not_need_a_variant_id() {
    let h = harness();
    h.auth.resolve(false);
    h.store.initialize().await;

    h.store
        .add_to_cart(new_line_without_variant(1, "black", "M", 1))
        .await;

    assert_eq!(h.store.total_items(), 1);
    assert_eq!(h.anonymous.read().await.len(), 1);
}
