use actix_web::{get, post, web, HttpResponse, ResponseError};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::LaggingError,
    lagging::{assembler::parse_year, LaggingEngine},
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataQuery {
    pub start_year: Option<String>,
    pub end_year: Option<String>,
}

#[get("/lagging/summary/{year}")]
pub async fn get_summary(
    year: web::Path<String>,
    engine: web::Data<LaggingEngine>,
) -> HttpResponse {
    let year = match parse_year(&year) {
        Ok(year) => year,
        Err(error) => return error.error_response(),
    };

    match engine.summary(year).await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(error) => error.error_response(),
    }
}
#[get("/lagging/chart-data")]
pub async fn get_chart_data(
    query: web::Query<ChartDataQuery>,
    engine: web::Data<LaggingEngine>,
) -> HttpResponse {
    let (start_year, end_year) = match (&query.start_year, &query.end_year) {
        (Some(start_year), Some(end_year)) => match (parse_year(start_year), parse_year(end_year)) {
            (Ok(start_year), Ok(end_year)) => (start_year, end_year),
            (Err(error), _) | (_, Err(error)) => return error.error_response(),
        },
        _ => {
            return LaggingError::invalid("INVALID_YEAR", "startYear and endYear are required")
                .error_response()
        }
    };

    match engine.chart_data(start_year, end_year).await {
        Ok(summaries) => HttpResponse::Ok().json(summaries),
        Err(error) => error.error_response(),
    }
}
#[post("/lagging/investigation-batch")]
pub async fn get_investigation_batch(
    payload: web::Json<Value>,
    engine: web::Data<LaggingEngine>,
) -> HttpResponse {
    let accident_ids: Option<Vec<String>> = payload
        .get("accidentIds")
        .and_then(Value::as_array)
        .and_then(|ids| {
            ids.iter()
                .map(|id| id.as_str().map(str::to_string))
                .collect()
        });
    let accident_ids = match accident_ids {
        Some(accident_ids) => accident_ids,
        None => {
            return LaggingError::invalid(
                "INVALID_ACCIDENT_IDS",
                "accidentIds must be an array of strings",
            )
            .error_response()
        }
    };

    match engine.investigation_status(&accident_ids).await {
        Ok(status) => HttpResponse::Ok().json(status),
        Err(error) => error.error_response(),
    }
}
#[post("/lagging/clear-cache")]
pub async fn clear_cache(engine: web::Data<LaggingEngine>) -> HttpResponse {
    let cleared = engine.clear_cache();
    HttpResponse::Ok().body(format!("Cleared {cleared} cached summaries"))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_summary)
        .service(get_chart_data)
        .service(get_investigation_batch)
        .service(clear_cache);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::EngineConfig,
        lagging::source::memory::MemorySource,
        models::{
            accident::{AccidentCategory, AccidentRecord, EmploymentRelation},
            investigation::{InvestigationRecord, InvestigationStatus},
            labor_hours::AnnualLaborHoursRecord,
            summary::LaggingSummary,
            victim::{VictimRecord, VictimSeverity},
        },
    };
    use actix_web::{http::StatusCode, test, App};
    use chrono::{TimeZone, Utc};
    use mongodb::bson::{self, oid::ObjectId};
    use std::{collections::BTreeMap, sync::Arc};

    fn source() -> MemorySource {
        let accident = AccidentRecord {
            _id: ObjectId::new(),
            code: "HQ-PLT1-2025-0001".to_string(),
            occurred_at: bson::DateTime::from_millis(
                Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0)
                    .unwrap()
                    .timestamp_millis(),
            ),
            category: AccidentCategory::Human,
            employment: EmploymentRelation::Employee,
        };
        MemorySource {
            victims: vec![VictimRecord {
                _id: ObjectId::new(),
                accident_id: accident._id,
                severity: VictimSeverity::Death,
                employment: None,
                absence_start: None,
                expected_return: None,
            }],
            labor_hours: vec![AnnualLaborHoursRecord {
                _id: ObjectId::new(),
                year: 2025,
                site_code: Some("PLT1".to_string()),
                employee_hours: 400_000.0,
                contractor_onsite_hours: 0.0,
                contractor_offsite_hours: 0.0,
                closed: false,
            }],
            investigations: vec![InvestigationRecord {
                _id: ObjectId::new(),
                accident_id: accident._id,
                status: InvestigationStatus::Completed,
            }],
            accidents: vec![accident],
            ..MemorySource::default()
        }
    }

    fn engine_data(source: MemorySource) -> web::Data<LaggingEngine> {
        web::Data::new(LaggingEngine::new(
            Arc::new(source),
            EngineConfig::default(),
        ))
    }

    #[actix_web::test]
    async fn test_get_summary() {
        let app = test::init_service(
            App::new()
                .app_data(engine_data(source()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/lagging/summary/2025")
            .to_request();
        let summary: LaggingSummary = test::call_and_read_body_json(&app, req).await;

        assert_eq!(summary.year, 2025);
        assert_eq!(summary.accidents.total, 1);
        assert_eq!(summary.victims.death.employee, 1);
        assert_eq!(summary.lost_days.total, 7_500);
        assert_eq!(summary.lost_time_injury_rate.employee, 0.5);
        assert_eq!(summary.severity_rate.employee, 18.75);
    }

    #[actix_web::test]
    async fn test_get_summary_rejects_bad_year() {
        let app = test::init_service(
            App::new()
                .app_data(engine_data(source()))
                .configure(configure),
        )
        .await;

        for uri in ["/lagging/summary/abc", "/lagging/summary/0", "/lagging/summary/-1"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert_eq!(test::read_body(resp).await, "INVALID_YEAR");
        }
    }

    #[actix_web::test]
    async fn test_store_outage_is_a_server_error() {
        let source = source();
        source
            .offline
            .store(true, std::sync::atomic::Ordering::SeqCst);
        let app = test::init_service(
            App::new()
                .app_data(engine_data(source))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/lagging/summary/2025")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn test_get_chart_data() {
        let app = test::init_service(
            App::new()
                .app_data(engine_data(source()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/lagging/chart-data?startYear=2024&endYear=2025")
            .to_request();
        let summaries: Vec<LaggingSummary> = test::call_and_read_body_json(&app, req).await;

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].year, 2024);
        assert_eq!(summaries[0].accidents.total, 0);
        assert_eq!(summaries[1].accidents.total, 1);
    }

    #[actix_web::test]
    async fn test_get_chart_data_rejects_bad_bounds() {
        let app = test::init_service(
            App::new()
                .app_data(engine_data(source()))
                .configure(configure),
        )
        .await;

        for uri in [
            "/lagging/chart-data?startYear=2024",
            "/lagging/chart-data?endYear=2025",
            "/lagging/chart-data?startYear=twenty&endYear=2025",
            "/lagging/chart-data?startYear=2026&endYear=2025",
        ] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[actix_web::test]
    async fn test_investigation_batch() {
        let source = source();
        let accident_id = source.accidents[0]._id.to_hex();
        let unknown = ObjectId::new().to_hex();
        let app = test::init_service(
            App::new()
                .app_data(engine_data(source))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/lagging/investigation-batch")
            .set_json(serde_json::json!({ "accidentIds": [accident_id, unknown] }))
            .to_request();
        let status: BTreeMap<String, bool> = test::call_and_read_body_json(&app, req).await;

        assert_eq!(status.get(&accident_id), Some(&true));
        assert_eq!(status.get(&unknown), Some(&false));
    }

    #[actix_web::test]
    async fn test_investigation_batch_rejects_bad_shape() {
        let app = test::init_service(
            App::new()
                .app_data(engine_data(source()))
                .configure(configure),
        )
        .await;

        for body in [
            serde_json::json!({}),
            serde_json::json!({ "accidentIds": "abc" }),
            serde_json::json!({ "accidentIds": [1, 2] }),
        ] {
            let req = test::TestRequest::post()
                .uri("/lagging/investigation-batch")
                .set_json(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert_eq!(test::read_body(resp).await, "INVALID_ACCIDENT_IDS");
        }
    }

    #[actix_web::test]
    async fn test_clear_cache_always_succeeds() {
        let engine = engine_data(source());
        let app = test::init_service(
            App::new()
                .app_data(engine.clone())
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/lagging/clear-cache")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        engine.summary(2025).await.unwrap();
        let req = test::TestRequest::post()
            .uri("/lagging/clear-cache")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "Cleared 1 cached summaries");
    }
}
