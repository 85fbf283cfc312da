//! Order repository tests against a live database.
//!
//! Run with: `DATABASE_URL=... cargo test -p maplecart-integration-tests -- --ignored`

use rust_decimal::Decimal;

use maplecart_shop::db::{
    CartRepository, NewProduct, OrderRepository, ProductRepository, RepositoryError,
};
use maplecart_shop::models::order_total;

use maplecart_integration_tests::{create_test_product, create_test_user, test_pool};

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_checkout_snapshots_cart_and_clears_it() {
    let pool = test_pool().await;
    let user = create_test_user(&pool).await;
    let syrup = create_test_product(&pool, &user, "Maple Syrup", "10.00").await;
    let mix = create_test_product(&pool, &user, "Pancake Mix", "5.00").await;

    let carts = CartRepository::new(&pool);
    carts.add(user.id, syrup.id).await.expect("add syrup");
    carts.add(user.id, mix.id).await.expect("add mix");
    carts.add(user.id, mix.id).await.expect("bump mix");

    let orders = OrderRepository::new(&pool);
    let order_id = orders.create_from_cart(user.id).await.expect("place order");

    // The cart is consumed in the same transaction
    assert!(
        carts
            .lines_for_user(user.id)
            .await
            .expect("list cart")
            .is_empty()
    );

    let items = orders.items(order_id).await.expect("order items");
    assert_eq!(items.len(), 2);

    let first = items.first().expect("first line");
    assert_eq!(first.title, "Maple Syrup");
    assert_eq!(first.quantity, 1);

    let second = items.get(1).expect("second line");
    assert_eq!(second.title, "Pancake Mix");
    assert_eq!(second.quantity, 2);

    assert_eq!(
        order_total(&items),
        "20.00".parse::<Decimal>().expect("total")
    );
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_empty_cart_cannot_become_an_order() {
    let pool = test_pool().await;
    let user = create_test_user(&pool).await;

    let orders = OrderRepository::new(&pool);
    let result = orders.create_from_cart(user.id).await;

    assert!(matches!(result, Err(RepositoryError::Conflict(_))));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_order_is_hidden_from_other_users() {
    let pool = test_pool().await;
    let owner = create_test_user(&pool).await;
    let stranger = create_test_user(&pool).await;
    let product = create_test_product(&pool, &owner, "Maple Syrup", "12.50").await;

    CartRepository::new(&pool)
        .add(owner.id, product.id)
        .await
        .expect("add to cart");

    let orders = OrderRepository::new(&pool);
    let order_id = orders
        .create_from_cart(owner.id)
        .await
        .expect("place order");

    assert!(
        orders
            .get_owned(order_id, owner.id)
            .await
            .expect("owner lookup")
            .is_some()
    );
    assert!(
        orders
            .get_owned(order_id, stranger.id)
            .await
            .expect("stranger lookup")
            .is_none()
    );
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_snapshot_survives_product_edits() {
    let pool = test_pool().await;
    let user = create_test_user(&pool).await;
    let product = create_test_product(&pool, &user, "Maple Syrup", "12.50").await;

    CartRepository::new(&pool)
        .add(user.id, product.id)
        .await
        .expect("add to cart");

    let orders = OrderRepository::new(&pool);
    let order_id = orders.create_from_cart(user.id).await.expect("place order");

    // Rewrite the source product after the order was placed
    let edited = NewProduct {
        title: "Maple Syrup (new recipe)",
        price: "99.99".parse().expect("price"),
        description: "Updated after checkout",
        image_url: "/images/new.png",
    };
    ProductRepository::new(&pool)
        .update_owned(product.id, user.id, &edited)
        .await
        .expect("edit product");

    let items = orders.items(order_id).await.expect("order items");
    let line = items.first().expect("one line");
    assert_eq!(line.title, "Maple Syrup");
    assert_eq!(line.price, "12.50".parse::<Decimal>().expect("price"));
}
