//! Car pages and the assignment toggle.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use taxi_core::{Car, CarFilter, LicenseNumber, NewCar, NewDriver};

#[tokio::test]
async fn test_list_and_search() {
    let (app, driver) = TestApp::logged_in().await;
    let manufacturer = app.manufacturer("Test Manufacturer", "Test Country");
    let other = app.manufacturer("Other", "Elsewhere");
    for (model, maker) in [("Test Car", &manufacturer), ("abc", &manufacturer), ("test two", &other)] {
        app.store()
            .create_car(NewCar::new(model, maker.id).with_drivers([driver.id]))
            .unwrap();
    }

    let json = app.get("/cars/").await.assert_page("taxi/car_list.html");
    assert_eq!(json["context"]["car_list"].as_array().unwrap().len(), 3);
    assert_eq!(json["context"]["manufacturer_list"].as_array().unwrap().len(), 2);

    let json = app.get("/cars/?model=TEST").await.assert_page("taxi/car_list.html");
    let models: Vec<&str> = json["context"]["car_list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["model"].as_str().unwrap())
        .collect();
    assert_eq!(models, ["Test Car", "test two"]);

    let url = format!("/cars/?model=test&manufacturer={}", other.id);
    let json = app.get(&url).await.assert_page("taxi/car_list.html");
    assert_eq!(json["context"]["car_list"][0]["model"], "test two");
    assert_eq!(json["context"]["car_list"].as_array().unwrap().len(), 1);

    let json = app.get("/cars/?model=nothing").await.assert_page("taxi/car_list.html");
    assert!(json["context"]["car_list"].as_array().unwrap().is_empty());

    let response = app.get("/cars/?manufacturer=abc").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_detail() {
    let (app, driver) = TestApp::logged_in().await;
    let manufacturer = app.manufacturer("Toyota", "Japan");
    let car = app
        .store()
        .create_car(NewCar::new("Corolla", manufacturer.id).with_drivers([driver.id]))
        .unwrap();

    let json = app
        .get(&format!("/cars/{}/", car.id))
        .await
        .assert_page("taxi/car_detail.html");
    assert_eq!(json["context"]["car"]["model"], "Corolla");
    assert_eq!(json["context"]["manufacturer"]["name"], "Toyota");
    assert_eq!(json["context"]["drivers"][0]["username"], "testuser");
    assert_eq!(json["context"]["is_assigned"], true);

    assert_eq!(app.get("/cars/999/").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_with_driver() {
    let (app, _) = TestApp::logged_in().await;
    let manufacturer = app.manufacturer("Test", "Test Country");
    let driver = app
        .store()
        .create_driver(
            NewDriver::new("testuser1", "password")
                .with_license(LicenseNumber::parse("ABC12345").unwrap()),
        )
        .unwrap();

    let json = app.get("/cars/create/").await.assert_page("taxi/car_form.html");
    assert_eq!(json["context"]["driver_choices"].as_array().unwrap().len(), 2);

    let body = format!(
        "model=Test+Car&manufacturer={}&drivers={}",
        manufacturer.id, driver.id
    );
    app.post_form("/cars/create/", &body)
        .await
        .assert_redirect("/cars/");

    let cars = app
        .store()
        .list_cars(&CarFilter::new(Some("Test Car"), None))
        .unwrap();
    assert_eq!(cars.len(), 1);
    assert_eq!(cars[0].model, "Test Car");
    assert_eq!(cars[0].manufacturer_id, manufacturer.id);
    assert!(app.store().is_assigned(driver.id, cars[0].id).unwrap());
}

#[tokio::test]
async fn test_create_invalid_choices() {
    let (app, _) = TestApp::logged_in().await;
    let response = app
        .post_form("/cars/create/", "model=Ghost&manufacturer=999&drivers=998")
        .await;

    let json = response.assert_page("taxi/car_form.html");
    assert_eq!(
        json["context"]["errors"]["manufacturer"][0],
        "Select a valid choice. That choice is not one of the available choices."
    );
    assert!(json["context"]["errors"]["drivers"].is_array());
    assert_eq!(app.store().count::<Car>().unwrap(), 0);
}

#[tokio::test]
async fn test_update_replaces_drivers() {
    let (app, me) = TestApp::logged_in().await;
    let manufacturer = app.manufacturer("Test Manufacturer", "Test Country");
    let other = app.driver("testuser1");
    let car = app
        .store()
        .create_car(NewCar::new("test", manufacturer.id).with_drivers([me.id]))
        .unwrap();
    let url = format!("/cars/{}/update/", car.id);

    let json = app.get(&url).await.assert_page("taxi/car_form.html");
    assert_eq!(json["context"]["form"]["drivers"][0], me.id.to_string());

    let body = format!(
        "model=bmw&manufacturer={}&drivers={}&drivers={}",
        manufacturer.id, other.id, me.id
    );
    app.post_form(&url, &body).await.assert_redirect("/cars/");

    let updated: Car = app.store().get(car.id).unwrap();
    assert_eq!(updated.model, "bmw");
    assert!(app.store().is_assigned(other.id, car.id).unwrap());
    assert!(app.store().is_assigned(me.id, car.id).unwrap());

    let body = format!("model=bmw&manufacturer={}", manufacturer.id);
    app.post_form(&url, &body).await.assert_redirect("/cars/");
    assert!(app.store().drivers_for_car(car.id).unwrap().is_empty());
}

#[tokio::test]
async fn test_delete() {
    let (app, me) = TestApp::logged_in().await;
    let manufacturer = app.manufacturer("Test", "USA");
    let car = app
        .store()
        .create_car(NewCar::new("test", manufacturer.id).with_drivers([me.id]))
        .unwrap();
    let url = format!("/cars/{}/delete/", car.id);

    app.get(&url).await.assert_page("taxi/car_confirm_delete.html");
    app.post_form(&url, "").await.assert_redirect("/cars/");
    assert!(app.store().find::<Car>(car.id).unwrap().is_none());
    assert!(app.store().cars_for_driver(me.id).unwrap().is_empty());
}

#[tokio::test]
async fn test_toggle_assign() {
    let (app, me) = TestApp::logged_in().await;
    let manufacturer = app.manufacturer("Test Manufacturer", "Test Country");
    let car = app
        .store()
        .create_car(NewCar::new("Test Car", manufacturer.id).with_drivers([me.id]))
        .unwrap();
    let url = format!("/cars/{}/toggle-assign/", car.id);
    let detail = format!("/cars/{}/", car.id);

    // Assigned -> removed.
    app.get(&url).await.assert_redirect(&detail);
    assert!(!app.store().is_assigned(me.id, car.id).unwrap());

    // Removed -> assigned again, via POST this time.
    app.post_form(&url, "").await.assert_redirect(&detail);
    assert!(app.store().is_assigned(me.id, car.id).unwrap());

    // Only the acting driver is affected.
    let other = app.driver("other");
    assert!(!app.store().is_assigned(other.id, car.id).unwrap());

    assert_eq!(
        app.get("/cars/999/toggle-assign/").await.status,
        StatusCode::NOT_FOUND
    );
}
