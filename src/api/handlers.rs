// HTTP request handlers for API endpoints

use actix_web::{web, HttpResponse};

use crate::api::error::ApiError;
use crate::api::models::*;
use crate::api::store::ReadStore;
use crate::db::pricing;

/// Health check endpoint
pub async fn health_check(store: web::Data<ReadStore>) -> HttpResponse {
    let (database, total_records) = match store.query(pricing::total_records).await {
        Ok(n) => ("connected", Some(n)),
        Err(err) => {
            tracing::warn!(error = %err, "health check could not reach database");
            ("disconnected", None)
        }
    };

    HttpResponse::Ok().json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        database: database.to_string(),
        total_records,
    }))
}

/// Distinct regions, ascending
pub async fn list_regions(store: web::Data<ReadStore>) -> Result<HttpResponse, ApiError> {
    let regions = store.query(pricing::all_regions).await?;
    let count = regions.len();
    Ok(HttpResponse::Ok().json(ApiResponse::success(RegionListResponse { regions, count })))
}

/// Price summary of every machine type seen in a region
pub async fn list_machines(
    store: web::Data<ReadStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let region_name = path.into_inner();
    let region = region_name.clone();
    let machines = store
        .query(move |conn| pricing::machines_by_region(conn, &region))
        .await?;
    let count = machines.len();

    Ok(HttpResponse::Ok().json(ApiResponse::success(MachineListResponse {
        region_name,
        machines,
        count,
    })))
}

pub async fn machine_history(
    store: web::Data<ReadStore>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (region_name, machine_type) = path.into_inner();
    let (region, machine) = (region_name.clone(), machine_type.clone());
    let detail = store
        .query(move |conn| pricing::machine_detail(conn, &region, &machine))
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("no prices for {machine_type} in {region_name}"))
        })?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(detail)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::routes::configure_routes;
    use crate::db::Db;
    use crate::ingest::load_records;
    use crate::snapshot::PriceRecord;
    use actix_web::{http::StatusCode, test, App};
    use chrono::DateTime;
    use serde_json::Value;
    use std::num::NonZeroUsize;

    fn record(machine: &str, region: &str, spot: f64, ts: i64) -> PriceRecord {
        PriceRecord {
            machine_type: machine.to_string(),
            region_name: region.to_string(),
            hour_price: spot * 3.0,
            spot_hour_price: spot,
            updated_ts: ts,
            updated: DateTime::from_timestamp(ts, 0).unwrap(),
        }
    }

    fn seeded_store(dir: &tempfile::TempDir) -> ReadStore {
        let path = dir.path().join("db.sqlite3");
        let mut db = Db::open(&path).unwrap();
        let records = vec![
            record("n1-standard-1", "us-central1", 0.02, 100),
            record("n1-standard-1", "us-central1", 0.01, 200),
            record("n1-standard-1", "us-central1", 0.03, 300),
            record("e2-micro", "us-central1", 0.002, 100),
            record("n1-standard-1", "europe-west1", 0.015, 100),
        ];
        load_records(&mut db.conn, &records, NonZeroUsize::new(10).unwrap(), |_| {}).unwrap();
        ReadStore::new(path)
    }

    async fn get(store: ReadStore, uri: &str) -> (StatusCode, Value) {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(store))
                .configure(configure_routes),
        )
        .await;
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }

    #[actix_web::test]
    async fn health_reports_record_count() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get(seeded_store(&dir), "/api/v1/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["database"], "connected");
        assert_eq!(body["data"]["total_records"], 5);
        assert!(body["meta"]["request_id"].is_string());
    }

    #[actix_web::test]
    async fn health_without_database_is_disconnected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReadStore::new(dir.path().join("missing.sqlite3"));
        let (status, body) = get(store, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["database"], "disconnected");
        assert!(body["data"].get("total_records").is_none());
    }

    #[actix_web::test]
    async fn regions_are_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get(seeded_store(&dir), "/api/v1/regions").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["data"]["regions"],
            serde_json::json!(["europe-west1", "us-central1"])
        );
        assert_eq!(body["data"]["count"], 2);
    }

    #[actix_web::test]
    async fn machines_carry_latest_price() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get(seeded_store(&dir), "/api/v1/regions/us-central1/machines").await;

        assert_eq!(status, StatusCode::OK);
        let machines = body["data"]["machines"].as_array().unwrap();
        assert_eq!(machines.len(), 2);
        assert_eq!(machines[0]["machine_type"], "n1-standard-1");
        assert_eq!(machines[0]["min_hour_spot_price"], 0.01);
        assert_eq!(machines[0]["max_hour_spot_price"], 0.03);
        assert_eq!(machines[0]["hour_spot_price"], 0.03);
        assert_eq!(machines[1]["machine_type"], "e2-micro");
    }

    #[actix_web::test]
    async fn history_is_ascending() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get(
            seeded_store(&dir),
            "/api/v1/regions/us-central1/machines/n1-standard-1/history",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let history = body["data"]["spot_hour_price_history"].as_array().unwrap();
        let prices: Vec<f64> = history.iter().map(|p| p["price"].as_f64().unwrap()).collect();
        assert_eq!(prices, vec![0.02, 0.01, 0.03]);
        assert_eq!(history[0]["timestamp"], "1970-01-01T00:01:40Z");
    }

    #[actix_web::test]
    async fn unknown_pair_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get(
            seeded_store(&dir),
            "/api/v1/regions/us-central1/machines/z9-huge/history",
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("z9-huge"));
    }

    #[actix_web::test]
    async fn database_failure_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReadStore::new(dir.path().join("missing.sqlite3"));
        let (status, body) = get(store, "/api/v1/regions").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
    }
}
