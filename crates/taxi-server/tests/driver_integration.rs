//! Driver pages: registration, license updates, search.

mod common;

use axum::http::StatusCode;
use common::{TestApp, PASSWORD};
use taxi_core::{Driver, LicenseNumber, NewCar, NewDriver};

fn licensed(app: &TestApp, username: &str, license: &str) -> Driver {
    app.store()
        .create_driver(
            NewDriver::new(username, PASSWORD).with_license(LicenseNumber::parse(license).unwrap()),
        )
        .unwrap()
}

#[tokio::test]
async fn test_list_and_search() {
    let mut app = TestApp::new();
    licensed(&app, "driver1", "ABC12345");
    licensed(&app, "driver2", "ABC12346");
    app.login("driver1", PASSWORD).await.assert_redirect("/");

    let json = app.get("/drivers/").await.assert_page("taxi/driver_list.html");
    let names: Vec<&str> = json["context"]["driver_list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["driver1", "driver2"]);
    assert_eq!(json["context"]["driver_list"][0]["license_number"], "ABC12345");
    assert!(json["context"]["driver_list"][0].get("password_hash").is_none());
    assert!(json["context"].get("empty_message").is_none());

    let json = app
        .get("/drivers/?username=DRIVER1")
        .await
        .assert_page("taxi/driver_list.html");
    assert_eq!(json["context"]["driver_list"].as_array().unwrap().len(), 1);

    let json = app
        .get("/drivers/?username=nonexistent_driver")
        .await
        .assert_page("taxi/driver_list.html");
    assert!(json["context"]["driver_list"].as_array().unwrap().is_empty());
    assert_eq!(
        json["context"]["empty_message"],
        "There are no drivers in the service."
    );
}

#[tokio::test]
async fn test_detail_lists_cars() {
    let (app, _) = TestApp::logged_in().await;
    let driver = licensed(&app, "driver", "ABC12345");
    let manufacturer = app.manufacturer("Toyota", "Japan");
    app.store()
        .create_car(NewCar::new("Corolla", manufacturer.id).with_drivers([driver.id]))
        .unwrap();

    let json = app
        .get(&format!("/drivers/{}/", driver.id))
        .await
        .assert_page("taxi/driver_detail.html");
    assert_eq!(json["context"]["driver"]["username"], "driver");
    assert_eq!(json["context"]["cars"][0]["model"], "Corolla");

    assert_eq!(app.get("/drivers/999/").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_registration() {
    let (app, _) = TestApp::logged_in().await;
    app.get("/drivers/create/")
        .await
        .assert_page("taxi/driver_form.html");

    let body = "username=new_user&password1=user1test&password2=user1test\
                &first_name=new_first_name&last_name=new_last_name&license_number=ABC12345";
    let response = app.post_form("/drivers/create/", body).await;

    let driver = app
        .store()
        .find_driver_by_username("new_user")
        .unwrap()
        .unwrap();
    response.assert_redirect(&format!("/drivers/{}/", driver.id));
    assert_eq!(driver.first_name, "new_first_name");
    assert_eq!(driver.last_name, "new_last_name");
    assert!(driver.check_password("user1test"));
}

#[tokio::test]
async fn test_registration_rejects_duplicates() {
    let (app, _) = TestApp::logged_in().await;
    licensed(&app, "taken", "ABC12345");

    let body = "username=taken&password1=pw-1&password2=pw-1&license_number=ABC12345";
    let json = app
        .post_form("/drivers/create/", body)
        .await
        .assert_page("taxi/driver_form.html");
    assert_eq!(
        json["context"]["errors"]["username"][0],
        "A user with that username already exists."
    );
    assert_eq!(
        json["context"]["errors"]["license_number"][0],
        "Driver with this License number already exists."
    );
    assert!(json["context"]["form"].get("password1").is_none());
}

#[tokio::test]
async fn test_license_update() {
    let (app, _) = TestApp::logged_in().await;
    let driver = licensed(&app, "testdriver", "ABC12345");
    let url = format!("/drivers/{}/update/", driver.id);

    let json = app.get(&url).await.assert_page("taxi/driver_form.html");
    assert_eq!(json["context"]["form"]["license_number"], "ABC12345");

    app.post_form(&url, "license_number=XYZ67890")
        .await
        .assert_redirect("/drivers/");
    let updated: Driver = app.store().get(driver.id).unwrap();
    assert_eq!(
        updated.license_number.as_ref().map(LicenseNumber::as_str),
        Some("XYZ67890")
    );
}

#[tokio::test]
async fn test_license_update_errors() {
    let (app, _) = TestApp::logged_in().await;
    let driver = licensed(&app, "testdriver", "ABC12345");
    let url = format!("/drivers/{}/update/", driver.id);

    for (value, message) in [
        ("XYZ123", "License number should consist of 8 characters"),
        ("xyz12345", "First 3 characters should be uppercase letters"),
        ("XYZ12abc", "Last 5 characters should be digits"),
    ] {
        let json = app
            .post_form(&url, &format!("license_number={value}"))
            .await
            .assert_page("taxi/driver_form.html");
        assert_eq!(json["context"]["errors"]["license_number"][0], message);
    }

    let unchanged: Driver = app.store().get(driver.id).unwrap();
    assert_eq!(unchanged.license_number, driver.license_number);
}

#[tokio::test]
async fn test_delete() {
    let (app, _) = TestApp::logged_in().await;
    let driver = licensed(&app, "driver", "ABC12345");
    let url = format!("/drivers/{}/delete/", driver.id);

    app.get(&url)
        .await
        .assert_page("taxi/driver_confirm_delete.html");
    app.post_form(&url, "").await.assert_redirect("/drivers/");
    assert!(app.store().find::<Driver>(driver.id).unwrap().is_none());

    // The license number can be reused afterwards.
    licensed(&app, "replacement", "ABC12345");
}

#[tokio::test]
async fn test_deleting_yourself_logs_you_out() {
    let (app, me) = TestApp::logged_in().await;
    app.post_form(&format!("/drivers/{}/delete/", me.id), "")
        .await
        .assert_redirect("/drivers/");
    app.get("/drivers/")
        .await
        .assert_redirect("/accounts/login/?next=%2Fdrivers%2F");
}
