use actix_web::http::{header, StatusCode};
use actix_web::{test, App};

#[actix_rt::test]
async fn test_unknown_api_route_is_json_404() {
    let app = test::init_service(App::new().configure(littr::api::routes("littr.git"))).await;
    let req = test::TestRequest::get()
        .uri("/api/accounts/johndoe/inbox/nope")
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json; charset=utf-8"
    );
    let body: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(body["status"], 404);
    assert_eq!(body["errors"][0]["code"], 404);
}
