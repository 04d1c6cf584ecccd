//! Integration tests for the session lifecycle and per-user cart persistence.
//!
//! Each test drives a full app root against a mock catalog server and an
//! in-memory gateway whose writes can be made to fail.

use rust_decimal::Decimal;

use storefront_sync::persistence::{CartScope, PersistenceGateway, keys};
use storefront_sync::stores::AuthError;
use storefront_sync_core::{Cart, HydrationStatus, ProductId, SessionStatus, UserId};
use storefront_sync_integration_tests::{TestContext, sample_products};

fn saved_cart(ctx: &TestContext, key: &str) -> Option<Cart> {
    ctx.gateway
        .get(key)
        .map(|json| serde_json::from_str(&json).expect("valid cart snapshot"))
}

// ============================================================================
// Login / Logout
// ============================================================================

#[tokio::test]
async fn test_user_cart_survives_logout_and_login() {
    let ctx = TestContext::new().await;
    ctx.serve_products(sample_products()).await;
    let app = &ctx.app;
    app.catalog().refresh().await;

    app.identity().login("bob", "1234").await.expect("login");
    let lamp = ProductId::new("1");
    app.cart().add_to_cart(&lamp, "Desk Lamp");
    app.cart().add_to_cart(&lamp, "Desk Lamp");

    app.identity().logout().await;
    assert!(app.cart().is_empty());
    assert_eq!(app.identity().status(), SessionStatus::Anonymous);
    assert_eq!(saved_cart(&ctx, "cart_1").map(|c| c.item_count()), Some(2));
    assert!(saved_cart(&ctx, keys::ANONYMOUS_CART).expect("anonymous snapshot").is_empty());

    app.identity().login("bob", "1234").await.expect("second login");
    assert_eq!(app.cart().hydration_status(), HydrationStatus::Loaded);
    assert_eq!(app.cart().get_product_count(&lamp), 2);

    let totals = app.cart().totals();
    assert_eq!(totals.total_original_price.amount(), Decimal::from(200));
    assert_eq!(totals.total_price.amount(), Decimal::from(180));
    assert_eq!(totals.total_discount.amount(), Decimal::from(20));
}

#[tokio::test]
async fn test_logout_clears_session_when_cart_save_fails() {
    let ctx = TestContext::new().await;
    let app = &ctx.app;

    app.identity().login("bob", "1234").await.expect("login");
    app.cart().add_to_cart(&ProductId::new("1"), "Desk Lamp");
    ctx.gateway.fail_writes_to(keys::USER_CART_PREFIX);

    app.identity().logout().await;

    assert!(!app.identity().is_logged_in());
    assert_eq!(app.identity().username(), "");
    assert!(ctx.gateway.get(keys::USER).is_none());
    assert!(ctx.gateway.get(keys::IS_AUTHENTICATED).is_none());
    assert!(app.cart().is_empty());
    assert!(app.cart().error().is_some());
    assert_eq!(app.cart().scope(), CartScope::Anonymous);
}

#[tokio::test]
async fn test_failed_login_leaves_state_untouched() {
    let ctx = TestContext::new().await;
    let app = &ctx.app;
    app.cart().add_to_cart(&ProductId::new("2"), "Stool");

    let err = app.identity().login("bob", "123").await.expect_err("short password");
    assert!(matches!(err, AuthError::InvalidPassword(_)));
    assert_eq!(app.identity().error().as_deref(), Some(err.to_string().as_str()));
    assert!(ctx.gateway.get(keys::USER).is_none());
    assert_eq!(app.cart().scope(), CartScope::Anonymous);
    assert_eq!(app.cart().item_count(), 1);
}

#[tokio::test]
async fn test_login_fails_when_session_cannot_be_persisted() {
    let ctx = TestContext::new().await;
    ctx.gateway.fail_writes_to(keys::USER);

    let err = ctx.app.identity().login("bob", "1234").await.expect_err("storage down");
    assert!(matches!(err, AuthError::Storage(_)));
    assert!(!ctx.app.identity().is_logged_in());

    ctx.gateway.heal();
    ctx.app.identity().login("bob", "1234").await.expect("login after heal");
    assert!(ctx.app.identity().is_logged_in());
}

// ============================================================================
// Register
// ============================================================================

#[tokio::test]
async fn test_register_authenticates_without_hydrating() {
    let ctx = TestContext::new().await;
    ctx.gateway
        .set(
            "cart_1",
            r#"{"items":[{"productId":"1","productName":"Desk Lamp","count":5}]}"#,
        )
        .expect("seed");
    let app = &ctx.app;
    app.cart().add_to_cart(&ProductId::new("2"), "Stool");

    let user = app
        .identity()
        .register("alice", "alice@x.com", "pwpw")
        .await
        .expect("register");

    assert!(app.identity().is_logged_in());
    assert_eq!(app.identity().user_email(), "alice@x.com");
    assert_eq!(app.cart().hydration_status(), HydrationStatus::Unknown);
    assert_eq!(app.cart().get_product_count(&ProductId::new("1")), 0);
    assert_eq!(app.cart().get_product_count(&ProductId::new("2")), 1);
    assert_eq!(app.cart().scope(), CartScope::User(user.id));
}

#[tokio::test]
async fn test_register_rejects_invalid_fields() {
    let ctx = TestContext::new().await;
    let identity = ctx.app.identity();

    assert!(matches!(
        identity.register("", "a@x.com", "pwpw").await,
        Err(AuthError::MissingUsername)
    ));
    assert!(matches!(
        identity.register("alice", "nobody", "pwpw").await,
        Err(AuthError::InvalidEmail(_))
    ));
    assert!(matches!(
        identity.register("alice", "a@x.com", "pw").await,
        Err(AuthError::InvalidPassword(_))
    ));
    assert!(!identity.is_logged_in());
}

// ============================================================================
// Cart scopes and restart
// ============================================================================

#[tokio::test]
async fn test_anonymous_snapshot_untouched_by_user_cart() {
    let ctx = TestContext::new().await;
    let app = &ctx.app;
    app.cart().add_to_cart(&ProductId::new("2"), "Stool");

    app.identity().login("bob", "1234").await.expect("login");
    app.cart().add_to_cart(&ProductId::new("1"), "Desk Lamp");

    let anonymous = saved_cart(&ctx, keys::ANONYMOUS_CART).expect("anonymous snapshot");
    assert_eq!(anonymous.item_count(), 1);
    assert_eq!(anonymous.count_of(&ProductId::new("1")), 0);
    assert_eq!(saved_cart(&ctx, "cart_1").map(|c| c.item_count()), Some(2));
}

#[tokio::test]
async fn test_restart_restores_session_and_cart() {
    let ctx = TestContext::new().await;
    ctx.app.identity().login("bob", "1234").await.expect("login");
    ctx.app.cart().add_to_cart(&ProductId::new("1"), "Desk Lamp");
    ctx.app.cart().update_quantity(&ProductId::new("1"), 3);

    let restarted = ctx.restart();
    let handle = restarted.identity().check_auth().expect("persisted session");
    assert_eq!(handle.user_id(), &UserId::new("1"));
    assert_eq!(handle.wait().await, HydrationStatus::Loaded);

    assert_eq!(restarted.identity().username(), "bob");
    assert_eq!(restarted.cart().get_product_count(&ProductId::new("1")), 3);
}

#[tokio::test]
async fn test_edit_before_restored_cart_loads_is_not_saved_over_it() {
    let ctx = TestContext::new().await;
    ctx.app.identity().login("bob", "1234").await.expect("login");
    ctx.app.cart().add_to_cart(&ProductId::new("1"), "Desk Lamp");
    ctx.app.cart().add_to_cart(&ProductId::new("1"), "Desk Lamp");

    let restarted = ctx.restart();
    let handle = restarted.identity().check_auth().expect("persisted session");
    restarted.cart().add_to_cart(&ProductId::new("2"), "Stool");
    assert_eq!(handle.wait().await, HydrationStatus::Loaded);

    assert_eq!(saved_cart(&ctx, "cart_1").map(|c| c.item_count()), Some(2));
    assert_eq!(restarted.cart().get_product_count(&ProductId::new("1")), 2);
    assert_eq!(restarted.cart().scope(), CartScope::User(UserId::new("1")));
}

#[tokio::test]
async fn test_restart_with_corrupt_user_cart_reports_failure() {
    let ctx = TestContext::new().await;
    ctx.app.identity().login("bob", "1234").await.expect("login");
    ctx.gateway.set("cart_1", "{oops").expect("corrupt");

    let restarted = ctx.restart();
    assert_eq!(restarted.bootstrap().await, HydrationStatus::Failed);
    assert!(restarted.identity().is_logged_in());
    assert!(restarted.cart().is_empty());
    assert!(restarted.cart().error().is_some());
}
