//! Integration tests for the cart and checkout flow

use jiff::Timestamp;
use testresult::TestResult;

use gamepart::prelude::*;

fn in_stock(catalog: &Catalog) -> Vec<Part> {
    catalog
        .parts()
        .iter()
        .filter(|part| part.in_stock)
        .cloned()
        .collect()
}

#[test]
fn cart_keeps_one_item_per_part_with_add_count() -> TestResult {
    let catalog = default_catalog()?;
    let parts = in_stock(&catalog);
    let mut cart = Cart::new();

    for (times, part) in (1_u32..).zip(&parts) {
        for _ in 0..times {
            cart.add(part);
        }
    }

    assert_eq!(cart.len(), parts.len());

    for (times, part) in (1_u32..).zip(&parts) {
        assert_eq!(cart.item(part.id).ok_or("missing item")?.quantity, times);
    }

    Ok(())
}

#[test]
fn quantity_floor_holds_for_any_delta_sequence() -> TestResult {
    let catalog = default_catalog()?;
    let part = in_stock(&catalog).into_iter().next().ok_or("no parts")?;
    let mut cart = Cart::new();
    cart.add(&part);

    for delta in [-1, -1, 5, -100, i64::MIN, 2, i64::MAX, -3] {
        cart.update_quantity(part.id, delta);

        assert!(cart.item(part.id).ok_or("missing item")?.quantity >= 1);
    }

    Ok(())
}

#[test]
fn out_of_stock_parts_never_enter_the_cart() -> TestResult {
    let catalog = default_catalog()?;
    let mut cart = Cart::new();

    for part in catalog.parts() {
        cart.add(part);
    }

    assert!(cart.items().iter().all(|item| item.part.in_stock));
    assert_eq!(cart.len(), 5);

    Ok(())
}

#[test]
fn failed_checkout_leaves_cart_unchanged() -> TestResult {
    let catalog = default_catalog()?;
    let mut cart = Cart::new();
    for part in in_stock(&catalog) {
        cart.add(&part);
    }
    let before = serde_json::to_string(&cart)?;

    let mut flow = CheckoutFlow::new();
    flow.open_cart()?;
    flow.proceed(&cart)?;
    let order = flow.confirm(&cart, Purchaser::Anonymous, Timestamp::UNIX_EPOCH)?;
    flow.fail()?;

    assert_eq!(serde_json::to_string(&cart)?, before);
    assert_eq!(flow.state(), CheckoutState::Confirming);
    assert_eq!(order.total, cart.total());

    Ok(())
}

#[test]
fn retry_after_failure_can_succeed() -> TestResult {
    let catalog = default_catalog()?;
    let mut cart = Cart::new();
    for part in in_stock(&catalog) {
        cart.add(&part);
    }
    let expected_total = cart.total();

    let mut flow = CheckoutFlow::new();
    flow.open_cart()?;
    flow.proceed(&cart)?;
    flow.confirm(&cart, Purchaser::Anonymous, Timestamp::UNIX_EPOCH)?;
    flow.fail()?;

    let order = flow.confirm(&cart, Purchaser::Anonymous, Timestamp::UNIX_EPOCH)?;
    flow.succeed(&mut cart)?;

    assert_eq!(order.total, expected_total);
    assert_eq!(order.total, 450 + 350 + 150 + 1200 + 50);
    assert!(cart.is_empty());
    assert_eq!(flow.state(), CheckoutState::Idle);

    Ok(())
}
