use greenloop_auth::UserId;
use greenloop_fetch::{handle_api_error, ApiClient, ApiError, CancellationToken, UploadFile};
use greenloop_items::{
    BrandsApi, CategoriesApi, CreateItemRequest, ItemQuery, ItemStatus, ItemsApi, PageQuery,
    UpdateItemRequest,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn owner() -> Value {
    json!({
        "userId": 4,
        "email": "owner@example.com",
        "firstName": "Olive",
        "lastName": "Owner",
        "userType": "CONSUMER"
    })
}

fn item(id: i64, name: &str, status: &str) -> Value {
    json!({
        "itemId": id,
        "owner": owner(),
        "name": name,
        "currentStatus": status,
        "images": [],
        "materialComposition": { "cotton": 80.0, "elastane": 20.0 },
        "createdAt": "2024-05-01T10:00:00Z",
        "updatedAt": "2024-05-01T10:00:00Z"
    })
}

#[tokio::test]
async fn test_get_items_returns_first_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/items"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "data": [item(1, "Denim jacket", "OWNED"), item(2, "Wool scarf", "LISTED")],
                "total": 5,
                "page": 1,
                "limit": 2,
                "totalPages": 3
            }
        })))
        .mount(&server)
        .await;

    let api = ItemsApi::new(ApiClient::new(&server.uri()).unwrap());
    let page = api
        .get_items(&ItemQuery::page(1, 2), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(page.data.len(), 2);
    assert_eq!(page.page, 1);
    assert!(!page.is_last_page());
    assert_eq!(page.data[1].current_status, ItemStatus::Listed);
    assert_eq!(page.data[0].owner.user_id, UserId::Numeric(4));
    assert_eq!(
        page.data[0].material_composition.as_ref().and_then(|m| m.get("cotton")),
        Some(&80.0)
    );
}

#[tokio::test]
async fn test_get_items_filters_by_status_and_owner() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/items"))
        .and(query_param("status", "RENTED"))
        .and(query_param("ownerId", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "data": [], "total": 0, "page": 1, "limit": 10, "totalPages": 0 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = ItemsApi::new(ApiClient::new(&server.uri()).unwrap());
    let query = ItemQuery {
        status: Some(ItemStatus::Rented),
        owner_id: Some(UserId::Numeric(4)),
        ..Default::default()
    };

    let page = api.get_items(&query, &CancellationToken::new()).await.unwrap();
    assert!(page.data.is_empty());
    assert!(page.is_last_page());
}

#[tokio::test]
async fn test_create_update_delete_item() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/items"))
        .and(body_json(json!({ "name": "Linen shirt", "categoryId": 2, "size": "M" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "data": item(10, "Linen shirt", "OWNED")
        })))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/items/10"))
        .and(body_json(json!({ "currentStatus": "LISTED" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": item(10, "Linen shirt", "LISTED")
        })))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/items/10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Item deleted"
        })))
        .mount(&server)
        .await;

    let api = ItemsApi::new(ApiClient::new(&server.uri()).unwrap());
    let cancel = CancellationToken::new();

    let created = api
        .create_item(
            &CreateItemRequest {
                name: "Linen shirt".into(),
                category_id: Some(2),
                size: Some("M".into()),
                ..Default::default()
            },
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(created.item_id, 10);

    let updated = api
        .update_item(
            10,
            &UpdateItemRequest {
                current_status: Some(ItemStatus::Listed),
                ..Default::default()
            },
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(updated.current_status, ItemStatus::Listed);

    api.delete_item(10, &cancel).await.unwrap();
}

#[tokio::test]
async fn test_missing_item_reports_backend_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/items/404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "success": false,
            "message": "Item not found"
        })))
        .mount(&server)
        .await;

    let api = ItemsApi::new(ApiClient::new(&server.uri()).unwrap());
    let err = api.get_item(404, &CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, ApiError::Rejected { status: 404, .. }));
    assert_eq!(handle_api_error(&err), "Item not found");
}

#[tokio::test]
async fn test_items_by_owner_uses_owner_path() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/items/owner/6f1c2a9e-3b7d-4c4e-9a51-0d2f8e7b1c33"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "data": [item(3, "Trench coat", "OWNED")], "total": 1, "page": 2, "limit": 5, "totalPages": 2 }
        })))
        .mount(&server)
        .await;

    let api = ItemsApi::new(ApiClient::new(&server.uri()).unwrap());
    let owner: UserId = serde_json::from_value(json!("6f1c2a9e-3b7d-4c4e-9a51-0d2f8e7b1c33")).unwrap();

    let page = api
        .get_items_by_owner(&owner, PageQuery::new(2, 5), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(page.data[0].name, "Trench coat");
    assert!(page.is_last_page());
}

#[tokio::test]
async fn test_upload_images_sends_images_field() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/items/7/images"))
        .respond_with(|req: &Request| {
            let body = String::from_utf8_lossy(&req.body).to_string();
            let urls: Vec<String> = (0..body.matches("name=\"images\"").count())
                .map(|i| format!("https://cdn.greenloop.example/items/7/{}.jpg", i))
                .collect();
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": urls }))
        })
        .mount(&server)
        .await;

    let api = ItemsApi::new(ApiClient::new(&server.uri()).unwrap());
    let files = vec![
        UploadFile::new("front.jpg", vec![1, 2, 3]).with_content_type("image/jpeg"),
        UploadFile::new("label.png", vec![4, 5, 6]).with_content_type("image/png"),
    ];

    let urls = api.upload_images(7, files, &CancellationToken::new()).await.unwrap();
    assert_eq!(urls.len(), 2);
}

#[tokio::test]
async fn test_categories_and_brands() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                { "categoryId": 1, "name": "Tops" },
                { "categoryId": 2, "name": "Outerwear", "description": "Coats and jackets" }
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/categories/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "categoryId": 2, "name": "Outerwear" }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/brands"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{ "brandId": 9, "name": "Patagonia", "sustainabilityRating": 4.5 }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/brands/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "brandId": 9, "name": "Patagonia" }
        })))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri()).unwrap();
    let categories = CategoriesApi::new(client.clone());
    let brands = BrandsApi::new(client);
    let cancel = CancellationToken::new();

    let all = categories.get_categories(&cancel).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].description.as_deref(), Some("Coats and jackets"));
    assert_eq!(categories.get_category(2, &cancel).await.unwrap().name, "Outerwear");

    let all = brands.get_brands(&cancel).await.unwrap();
    assert_eq!(all[0].sustainability_rating, Some(4.5));
    assert_eq!(brands.get_brand(9, &cancel).await.unwrap().name, "Patagonia");
}
