// handlers/products.rs - POST /api/products, PUT /api/products/:id
//
// Reads and deletes are the generic handlers in catalog.rs.

use axum::extract::{Multipart, Path, State};
use uuid::Uuid;

use super::catalog::{self, category_error, required, Catalog};
use crate::database::models::{CabinetCategory, Product};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::upload::{image_objects, read_form, PRODUCT_FORM};

pub async fn create(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Product> {
    let mut form = read_form(multipart, &PRODUCT_FORM).await?;

    let name = required(&form, "name")?.to_string();
    let description = required(&form, "description")?.to_string();
    let price = parse_price(required(&form, "price")?)?;
    let category = required(&form, "category")?
        .parse::<CabinetCategory>()
        .map_err(category_error)?;

    let images = state
        .uploads
        .store_images(form.take_files("images"), Product::FOLDER)
        .await?;
    let uploaded = image_objects(&images).collect();

    let product = Product {
        id: Uuid::new_v4(),
        name,
        description,
        price,
        category,
        images,
    };
    let product = catalog::commit_create(&state, product, uploaded).await?;
    Ok(ApiResponse::created(product))
}

/// Fields left out keep their value; new images replace the old set.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Product> {
    let id = catalog::parse_id::<Product>(&id)?;
    let mut form = read_form(multipart, &PRODUCT_FORM).await?;

    let price = form.text("price").map(parse_price).transpose()?;
    let category = form
        .text("category")
        .map(|c| c.parse::<CabinetCategory>().map_err(category_error))
        .transpose()?;

    let mut product: Product = catalog::load(&state, id).await?;
    if let Some(name) = form.text("name") {
        product.name = name.to_string();
    }
    if let Some(description) = form.text("description") {
        product.description = description.to_string();
    }
    if let Some(price) = price {
        product.price = price;
    }
    if let Some(category) = category {
        product.category = category;
    }

    let (uploaded, replaced) = if form.has_files("images") {
        let images = state
            .uploads
            .store_images(form.take_files("images"), Product::FOLDER)
            .await?;
        let uploaded = image_objects(&images).collect();
        let replaced = image_objects(&product.images).collect();
        product.images = images;
        (uploaded, replaced)
    } else {
        (Vec::new(), Vec::new())
    };

    let product = catalog::commit_update(&state, product, uploaded, replaced).await?;
    Ok(ApiResponse::success(product))
}

fn parse_price(raw: &str) -> Result<f64, ApiError> {
    raw.parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
        .ok_or_else(|| ApiError::invalid_field("price", "must be a number"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::database::models::ImageRef;
    use crate::storage::ResourceType;
    use crate::testing::{authed, get, MultipartForm, TestApp};
    use crate::upload::image::tests::{sample_jpeg, sample_png};
    use axum::http::{Method, StatusCode};

    const PANEL: &str = "ตู้พาเนล";
    const FRAME: &str = "ตู้เฟรม";

    fn product_form() -> MultipartForm {
        MultipartForm::new()
            .text("name", "Cabinet A")
            .text("description", "Outdoor panel cabinet")
            .text("price", "1500.50")
            .text("category", PANEL)
    }

    fn seeded_product(app: &TestApp, category: CabinetCategory, image_ids: &[&str]) -> Product {
        let product = Product {
            id: Uuid::new_v4(),
            name: "Seeded".to_string(),
            description: "Seeded product".to_string(),
            price: 100.0,
            category,
            images: image_ids
                .iter()
                .map(|id| ImageRef {
                    url: format!("https://storage.test/image/{}", id),
                    public_id: id.to_string(),
                })
                .collect(),
        };
        app.products.seed(product.clone());
        product
    }

    fn encoded(value: &str) -> String {
        url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
    }

    #[test]
    fn price_must_be_a_finite_number() {
        assert_eq!(parse_price("1500.50").unwrap(), 1500.5);
        assert_eq!(parse_price("0").unwrap(), 0.0);
        assert!(parse_price("abc").is_err());
        assert!(parse_price("NaN").is_err());
        assert!(parse_price("inf").is_err());
    }

    #[tokio::test]
    async fn create_stores_optimized_images() -> anyhow::Result<()> {
        let app = TestApp::new();
        let token = app.admin_token().await;

        let request = product_form()
            .file("images", "a.png", "image/png", &sample_png(1000, 500))
            .file("images", "b.jpg", "image/jpeg", &sample_jpeg(400, 300))
            .request(Method::POST, "/api/products", Some(&token));
        let (status, body) = app.send(request).await;

        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["name"], "Cabinet A");
        assert_eq!(body["data"]["price"], 1500.5);
        assert_eq!(body["data"]["category"], PANEL);
        assert_eq!(body["data"]["images"].as_array().map(Vec::len), Some(2));
        assert!(body["data"]["_id"].is_string());
        assert!(body["data"]["images"][0]["publicId"].is_string());

        let uploads = app.storage.uploads();
        assert_eq!(uploads.len(), 2);
        assert!(uploads.iter().all(|u| u.folder == "products"));
        assert!(uploads.iter().all(|u| u.resource_type == ResourceType::Image));
        assert_eq!(app.products.all().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn create_requires_an_admin_token() -> anyhow::Result<()> {
        let app = TestApp::new();

        let (status, body) = app
            .send(product_form().request(Method::POST, "/api/products", None))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Authentication required");

        let (status, _) = app
            .send(product_form().request(Method::POST, "/api/products", Some("garbage")))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let user_token = app.token_for(Role::User).await;
        let (status, body) = app
            .send(product_form().request(Method::POST, "/api/products", Some(&user_token)))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Admin access required");

        assert!(app.products.all().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn create_validates_before_uploading() -> anyhow::Result<()> {
        let app = TestApp::new();
        let token = app.admin_token().await;
        let png = sample_png(50, 50);

        let bad_price = MultipartForm::new()
            .text("name", "Cabinet A")
            .text("description", "d")
            .text("price", "cheap")
            .text("category", PANEL)
            .file("images", "a.png", "image/png", &png);
        let (status, body) = app
            .send(bad_price.request(Method::POST, "/api/products", Some(&token)))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field_errors"]["price"], "must be a number");

        let bad_category = MultipartForm::new()
            .text("name", "Cabinet A")
            .text("description", "d")
            .text("price", "10")
            .text("category", "wardrobe")
            .file("images", "a.png", "image/png", &png);
        let (status, _) = app
            .send(bad_category.request(Method::POST, "/api/products", Some(&token)))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let missing_name = MultipartForm::new()
            .text("description", "d")
            .text("price", "10")
            .text("category", PANEL);
        let (status, body) = app
            .send(missing_name.request(Method::POST, "/api/products", Some(&token)))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field_errors"]["name"], "is required");

        let gif = product_form().file("images", "a.gif", "image/gif", b"GIF89a");
        let (status, _) = app
            .send(gif.request(Method::POST, "/api/products", Some(&token)))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let stray_file = product_form().file("photo", "a.png", "image/png", &png);
        let (status, _) = app
            .send(stray_file.request(Method::POST, "/api/products", Some(&token)))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert!(app.storage.uploads().is_empty());
        assert!(app.products.all().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn failed_insert_destroys_uploaded_images() -> anyhow::Result<()> {
        let app = TestApp::new();
        let token = app.admin_token().await;
        app.products.fail_writes();

        let request = product_form()
            .file("images", "a.png", "image/png", &sample_png(60, 40))
            .request(Method::POST, "/api/products", Some(&token));
        let (status, _) = app.send(request).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let uploaded: Vec<_> = app
            .storage
            .uploads()
            .into_iter()
            .map(|u| (u.public_id, u.resource_type))
            .collect();
        assert_eq!(uploaded.len(), 1);
        assert_eq!(app.storage.destroyed(), uploaded);
        Ok(())
    }

    #[tokio::test]
    async fn storage_failure_is_a_bad_gateway() -> anyhow::Result<()> {
        let app = TestApp::new();
        let token = app.admin_token().await;
        app.storage.fail_uploads();

        let request = product_form()
            .file("images", "a.png", "image/png", &sample_png(60, 40))
            .request(Method::POST, "/api/products", Some(&token));
        let (status, _) = app.send(request).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(app.products.all().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn update_with_images_replaces_the_old_set() -> anyhow::Result<()> {
        let app = TestApp::new();
        let token = app.admin_token().await;
        let product = seeded_product(&app, CabinetCategory::Panel, &["products/old1", "products/old2"]);

        let request = MultipartForm::new()
            .text("name", "Renamed")
            .text("category", FRAME)
            .file("images", "new.png", "image/png", &sample_png(90, 60))
            .request(Method::PUT, &format!("/api/products/{}", product.id), Some(&token));
        let (status, body) = app.send(request).await;

        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["data"]["name"], "Renamed");
        assert_eq!(body["data"]["description"], "Seeded product");
        assert_eq!(body["data"]["price"], 100.0);
        assert_eq!(body["data"]["category"], FRAME);

        let new_id = app.storage.uploads()[0].public_id.clone();
        let stored = &app.products.all()[0];
        assert_eq!(stored.images.len(), 1);
        assert_eq!(stored.images[0].public_id, new_id);
        assert_eq!(
            app.storage.destroyed(),
            vec![
                ("products/old1".to_string(), ResourceType::Image),
                ("products/old2".to_string(), ResourceType::Image),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn update_without_images_keeps_them() -> anyhow::Result<()> {
        let app = TestApp::new();
        let token = app.admin_token().await;
        let product = seeded_product(&app, CabinetCategory::Panel, &["products/keep"]);

        let request = MultipartForm::new()
            .text("price", "250")
            .request(Method::PUT, &format!("/api/products/{}", product.id), Some(&token));
        let (status, body) = app.send(request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["price"], 250.0);
        assert_eq!(body["data"]["images"][0]["publicId"], "products/keep");
        assert!(app.storage.destroyed().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn update_rejects_bad_input_and_unknown_ids() -> anyhow::Result<()> {
        let app = TestApp::new();
        let token = app.admin_token().await;
        let product = seeded_product(&app, CabinetCategory::Panel, &[]);

        let request = MultipartForm::new()
            .text("category", "wardrobe")
            .request(Method::PUT, &format!("/api/products/{}", product.id), Some(&token));
        let (status, _) = app.send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let request = MultipartForm::new()
            .text("name", "Ghost")
            .file("images", "a.png", "image/png", &sample_png(20, 20))
            .request(Method::PUT, &format!("/api/products/{}", Uuid::new_v4()), Some(&token));
        let (status, body) = app.send(request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Product not found");
        assert!(app.storage.uploads().is_empty());

        let request = MultipartForm::new()
            .text("name", "Ghost")
            .request(Method::PUT, "/api/products/not-a-uuid", Some(&token));
        let (status, _) = app.send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert_eq!(app.products.all()[0].category, CabinetCategory::Panel);
        Ok(())
    }

    #[tokio::test]
    async fn delete_removes_record_and_images() -> anyhow::Result<()> {
        let app = TestApp::new();
        let token = app.admin_token().await;
        let product = seeded_product(&app, CabinetCategory::Frame, &["products/a", "products/b"]);
        app.storage.fail_destroy_of("products/a");

        let uri = format!("/api/products/{}", product.id);
        let (status, body) = app.send(authed(Method::DELETE, &uri, &token)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["message"], "Product deleted successfully");
        assert!(app.products.all().is_empty());
        assert_eq!(
            app.storage.destroyed(),
            vec![("products/b".to_string(), ResourceType::Image)]
        );

        let (status, _) = app.send(authed(Method::DELETE, &uri, &token)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn list_filters_by_category() -> anyhow::Result<()> {
        let app = TestApp::new();
        seeded_product(&app, CabinetCategory::Panel, &[]);
        seeded_product(&app, CabinetCategory::Frame, &[]);
        seeded_product(&app, CabinetCategory::Frame, &[]);

        let (status, body) = app.send(get("/api/products")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().map(Vec::len), Some(3));

        let (status, body) = app
            .send(get(&format!("/api/products?category={}", encoded(FRAME))))
            .await;
        assert_eq!(status, StatusCode::OK);
        let frames = body["data"].as_array().cloned().unwrap_or_default();
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|p| p["category"] == FRAME));

        let (status, _) = app.send(get("/api/products?category=wardrobe")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn get_by_id() -> anyhow::Result<()> {
        let app = TestApp::new();
        let product = seeded_product(&app, CabinetCategory::Panel, &[]);

        let (status, body) = app.send(get(&format!("/api/products/{}", product.id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["_id"], product.id.to_string());

        let (status, _) = app.send(get(&format!("/api/products/{}", Uuid::new_v4()))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app.send(get("/api/products/123")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        Ok(())
    }
}
