//! Cart repository tests against a live database.
//!
//! Run with: `DATABASE_URL=... cargo test -p maplecart-integration-tests -- --ignored`

use maplecart_core::ProductId;
use maplecart_shop::db::{CartRepository, RepositoryError};

use maplecart_integration_tests::{create_test_product, create_test_user, test_pool};

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_adding_carted_product_merges_to_one_line() {
    let pool = test_pool().await;
    let user = create_test_user(&pool).await;
    let product = create_test_product(&pool, &user, "Maple Syrup", "12.50").await;

    let carts = CartRepository::new(&pool);
    carts.add(user.id, product.id).await.expect("first add");
    carts.add(user.id, product.id).await.expect("second add");

    let lines = carts.lines_for_user(user.id).await.expect("list cart");
    assert_eq!(lines.len(), 1);

    let line = lines.first().expect("one merged line");
    assert_eq!(line.product_id, product.id);
    assert_eq!(line.quantity, 2);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_cart_lines_keep_insertion_order() {
    let pool = test_pool().await;
    let user = create_test_user(&pool).await;
    let first = create_test_product(&pool, &user, "Maple Syrup", "12.50").await;
    let second = create_test_product(&pool, &user, "Pancake Mix", "6.00").await;

    let carts = CartRepository::new(&pool);
    carts.add(user.id, first.id).await.expect("add first");
    carts.add(user.id, second.id).await.expect("add second");
    // A bump must not move the line to the back
    carts.add(user.id, first.id).await.expect("bump first");

    let lines = carts.lines_for_user(user.id).await.expect("list cart");
    let ids: Vec<ProductId> = lines.iter().map(|l| l.product_id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_adding_unknown_product_reports_not_found() {
    let pool = test_pool().await;
    let user = create_test_user(&pool).await;

    let carts = CartRepository::new(&pool);
    let result = carts.add(user.id, ProductId::new(i32::MAX)).await;

    assert!(matches!(result, Err(RepositoryError::NotFound)));
    assert!(
        carts
            .lines_for_user(user.id)
            .await
            .expect("list cart")
            .is_empty()
    );
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_removing_missing_line_is_a_no_op() {
    let pool = test_pool().await;
    let user = create_test_user(&pool).await;
    let product = create_test_product(&pool, &user, "Maple Syrup", "12.50").await;

    let carts = CartRepository::new(&pool);
    carts
        .remove(user.id, product.id)
        .await
        .expect("remove of an uncarted product succeeds");
}
