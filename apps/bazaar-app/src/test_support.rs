//! Fixtures shared by the handler tests.

use crate::state::{ConfigState, DbState, Session};
use bazaar_core::checkout::PaymentDetails;
use bazaar_core::validation::validate_new_product;
use bazaar_core::{Country, NewProduct, NewUser, ShippingAddress, UserRole};

pub async fn setup() -> (DbState, ConfigState) {
    let db = DbState::in_memory().await.unwrap();
    (db, ConfigState::default())
}

/// A valid registration form; the password is `Secur3!pass`.
pub fn registration(name: &str, email: &str) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: email.to_string(),
        phone: "9000000000".to_string(),
        age: 30,
        password: "Secur3!pass".to_string(),
        country: "India".to_string(),
    }
}

pub async fn customer_session(db: &DbState) -> Session {
    let user = db
        .inner()
        .users()
        .create(
            &registration("Asha Rao", "asha@example.com"),
            Country::India,
            UserRole::Customer,
        )
        .await
        .unwrap();
    Session::new(&user)
}

pub async fn admin_session(db: &DbState) -> Session {
    let user = db
        .inner()
        .users()
        .create(
            &registration("Store Admin", "admin@example.com"),
            Country::India,
            UserRole::Admin,
        )
        .await
        .unwrap();
    Session::new(&user)
}

/// An "add product" form: 10% off, 5 in stock, category Home.
pub fn new_product_form(name: &str, price: &str, country: &str) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        description: format!("{name} for the living room"),
        price: price.to_string(),
        discount_percentage: 10.0,
        quantity: 5,
        category: "Home".to_string(),
        country: country.to_string(),
        image: None,
    }
}

/// Inserts an Indian catalog product owned by `owner` and returns its ID.
pub async fn seed_product(
    db: &DbState,
    owner: &Session,
    name: &str,
    price: f64,
    discount: f64,
    quantity: i64,
) -> i64 {
    let form = NewProduct {
        discount_percentage: discount,
        quantity,
        ..new_product_form(name, &price.to_string(), "India")
    };
    let draft = validate_new_product(&form, Some(owner.user_id())).unwrap();
    db.inner().products().insert_many(&[draft]).await.unwrap()[0]
}

pub async fn stock(db: &DbState, product_id: i64) -> i64 {
    db.inner()
        .products()
        .get_by_id(product_id)
        .await
        .unwrap()
        .unwrap()
        .quantity
}

pub fn address() -> ShippingAddress {
    ShippingAddress {
        first_name: "Asha".to_string(),
        last_name: "Rao".to_string(),
        email: "asha@example.com".to_string(),
        address: "12 MG Road".to_string(),
        city: "Pune".to_string(),
        postal_code: "411001".to_string(),
        phone: "9876543210".to_string(),
    }
}

pub fn card() -> PaymentDetails {
    PaymentDetails {
        card_number: "4111111111111111".to_string(),
        expiry_date: "12/29".to_string(),
        cvv: "123".to_string(),
    }
}
