use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use shopai_api::dto::search::SearchResultDto;
use shopai_api::models::Product;
use shopai_api::routes::params::Pagination;
use shopai_api::services::agent_service::search_result_to_value;
use shopai_api::services::search_service::{product_to_metadata, product_to_text};
use shopai_api::vectors::build_metadata_filter;

fn sample_product() -> Product {
    Product {
        id: Uuid::new_v4(),
        name: "Portable Bluetooth Speaker".to_string(),
        description: Some("Waterproof portable speaker".to_string()),
        price: 79.99,
        category: "Audio".to_string(),
        brand: Some("SoundWave".to_string()),
        image_url: None,
        stock_quantity: 40,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn filter_merges_price_bounds_into_one_clause() {
    let filter = build_metadata_filter(Some("Audio"), Some(10.0), Some(100.0)).expect("filter");
    assert_eq!(filter["category"], json!({ "$eq": "Audio" }));
    assert_eq!(filter["price"], json!({ "$gte": 10.0, "$lte": 100.0 }));
}

#[test]
fn filter_handles_single_sided_price_bounds() {
    let lower = build_metadata_filter(None, Some(25.0), None).expect("filter");
    assert_eq!(lower["price"], json!({ "$gte": 25.0 }));
    assert!(lower.get("category").is_none());

    let upper = build_metadata_filter(None, None, Some(50.0)).expect("filter");
    assert_eq!(upper["price"], json!({ "$lte": 50.0 }));
}

#[test]
fn no_parameters_means_no_filter() {
    assert!(build_metadata_filter(None, None, None).is_none());
    // An empty category string is treated as absent.
    assert!(build_metadata_filter(Some(""), None, None).is_none());
}

#[test]
fn product_text_joins_non_empty_parts() {
    let product = sample_product();
    let text = product_to_text(&product);
    assert_eq!(
        text,
        "Portable Bluetooth Speaker Waterproof portable speaker Audio SoundWave price $79.99"
    );
}

#[test]
fn product_text_skips_missing_description_and_brand() {
    let mut product = sample_product();
    product.description = None;
    product.brand = None;
    let text = product_to_text(&product);
    assert_eq!(text, "Portable Bluetooth Speaker Audio price $79.99");
}

#[test]
fn metadata_carries_the_filterable_fields() {
    let product = sample_product();
    let metadata = product_to_metadata(&product);
    assert_eq!(metadata["product_id"], json!(product.id));
    assert_eq!(metadata["category"], json!("Audio"));
    assert_eq!(metadata["price"], json!(79.99));
    assert_eq!(metadata["is_active"], json!(true));
}

#[test]
fn search_hits_flatten_into_product_objects_with_similarity() {
    let product = sample_product();
    let id = product.id;
    let value = search_result_to_value(&SearchResultDto {
        product,
        similarity: 0.8765,
    });

    assert_eq!(value["id"], json!(id));
    assert_eq!(value["similarity"], json!(0.8765));
    assert_eq!(value["name"], json!("Portable Bluetooth Speaker"));
}

#[test]
fn pagination_normalizes_out_of_range_input() {
    let pagination = Pagination {
        page: Some(0),
        per_page: Some(1000),
    };
    assert_eq!(pagination.normalize(), (1, 100, 0));

    let default = Pagination {
        page: None,
        per_page: None,
    };
    assert_eq!(default.normalize(), (1, 20, 0));

    let third_page = Pagination {
        page: Some(3),
        per_page: Some(10),
    };
    assert_eq!(third_page.normalize(), (3, 10, 20));
}
