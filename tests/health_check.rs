use actix_web::{test, web, App};
use chrono::DateTime;

#[actix_web::test]
async fn test_health_check() {
    // Liveness must not depend on any backing service.
    let app = test::init_service(
        App::new().route("/health", web::get().to(credo_server::health_check)),
    )
    .await;

    // Send request
    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;

    // Assert response
    assert!(resp.status().is_success());

    // Parse response body
    let body = test::read_body(resp).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    // Verify response format
    assert_eq!(json["status"], "healthy");
    assert!(DateTime::parse_from_rfc3339(json["timestamp"].as_str().unwrap()).is_ok());
}
