use crate::{
    api::error::ApiError,
    model::{attendance::Attendance, student::Student},
};
use actix_web::{HttpResponse, http::header, web};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{debug, info};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CheckInRequest {
    #[schema(example = "S1")]
    pub serial_id: Option<String>,
}

impl CheckInRequest {
    /// Anything that is not a JSON object with a string `serial_id` counts as missing.
    pub fn serial_id_from(body: &[u8]) -> Result<String, ApiError> {
        // serde would happily read a struct out of a JSON array, so insist on an object
        let object = match serde_json::from_slice::<Value>(body) {
            Ok(value @ Value::Object(_)) => value,
            _ => return Err(ApiError::MissingSerialId),
        };

        serde_json::from_value::<CheckInRequest>(object)
            .ok()
            .and_then(|req| req.serial_id)
            .ok_or(ApiError::MissingSerialId)
    }
}

#[derive(Serialize, ToSchema)]
pub struct SuccessResponse {
    #[schema(example = "Attendance recorded successfully")]
    pub success: String,
}

/// List students
#[utoipa::path(
    get,
    path = "/attendance",
    responses(
        (status = 200, description = "Every registered student", body = [Student])
    ),
    tag = "Attendance"
)]
pub async fn list_students(pool: web::Data<SqlitePool>) -> Result<HttpResponse, ApiError> {
    let students = Student::all(pool.get_ref()).await?;
    debug!(count = students.len(), "Listing students");

    Ok(HttpResponse::Ok().json(students))
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/attendance",
    request_body = CheckInRequest,
    responses(
        (status = 201, description = "Attendance recorded", body = SuccessResponse, example = json!({
            "success": "Attendance recorded successfully"
        })),
        (status = 400, description = "Missing or unknown serial ID", body = ErrorResponse, example = json!({
            "error": "Invalid Serial ID"
        })),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    pool: web::Data<SqlitePool>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let serial_id = CheckInRequest::serial_id_from(&body)?;

    // lookup and insert share one connection; dropping the tx early rolls back
    let mut tx = pool.begin().await?;

    let student = Student::find_by_serial(&mut *tx, &serial_id)
        .await?
        .ok_or(ApiError::InvalidSerialId)?;

    let attendance_id = Attendance::record(&mut *tx, student.id, Local::now().naive_local()).await?;
    tx.commit().await?;

    info!(attendance_id, student_id = student.id, "Attendance recorded");

    Ok(HttpResponse::Created().json(SuccessResponse {
        success: "Attendance recorded successfully".to_string(),
    }))
}

/// Fallback for every other verb on `/attendance`.
#[utoipa::path(
    delete,
    path = "/attendance",
    responses(
        (status = 405, description = "Only GET and POST are supported", body = ErrorResponse, example = json!({
            "error": "This endpoint only supports GET and POST requests"
        }))
    ),
    tag = "Attendance"
)]
pub async fn method_not_allowed() -> Result<HttpResponse, ApiError> {
    Err(ApiError::MethodNotAllowed)
}

/// Answers `OPTIONS /attendance` with the verbs the route serves.
pub async fn allowed_methods() -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((header::ALLOW, "GET, HEAD, OPTIONS, POST"))
        .finish()
}

/// Attendance history for one student
#[utoipa::path(
    get,
    path = "/attendance/{student_id}",
    params(
        ("student_id" = i64, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Attendance records, oldest first", body = [Attendance]),
        (status = 404, description = "Student unknown or without records", body = ErrorResponse, example = json!({
            "error": "Student not found"
        })),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Attendance"
)]
pub async fn get_student_attendance(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let student_id = path.into_inner();

    let student = Student::find(pool.get_ref(), student_id)
        .await?
        .ok_or(ApiError::StudentNotFound)?;

    let records = Attendance::for_student(pool.get_ref(), student.id).await?;
    if records.is_empty() {
        return Err(ApiError::NoAttendanceRecords);
    }

    Ok(HttpResponse::Ok().json(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, routes};
    use actix_web::{App, middleware::NormalizePath, test};
    use serde_json::json;

    async fn seeded_pool() -> SqlitePool {
        let pool = db::memory_pool().await;
        db::initialize_schema(&pool).await.unwrap();
        Student::insert(&pool, "Ann", "S1").await.unwrap();
        pool
    }

    macro_rules! app {
        ($pool:expr) => {
            test::init_service(
                App::new()
                    .wrap(NormalizePath::trim())
                    .app_data(web::Data::new($pool.clone()))
                    .configure(|cfg| routes::configure(cfg, None)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn lists_every_student() {
        let pool = seeded_pool().await;
        Student::insert(&pool, "Bob", "S2").await.unwrap();
        let app = app!(pool);

        let req = test::TestRequest::get().uri("/attendance").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body,
            json!([
                { "id": 1, "name": "Ann", "serial_id": "S1" },
                { "id": 2, "name": "Bob", "serial_id": "S2" }
            ])
        );
    }

    #[actix_web::test]
    async fn empty_student_list_is_ok() {
        let pool = db::memory_pool().await;
        db::initialize_schema(&pool).await.unwrap();
        let app = app!(pool);

        let req = test::TestRequest::get().uri("/attendance/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!([]));
    }

    #[actix_web::test]
    async fn check_in_records_one_row() {
        let pool = seeded_pool().await;
        let app = app!(pool);

        for expected in 1..=2 {
            let req = test::TestRequest::post()
                .uri("/attendance")
                .set_json(json!({ "serial_id": "S1" }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 201);

            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body, json!({ "success": "Attendance recorded successfully" }));
            assert_eq!(Attendance::for_student(&pool, 1).await.unwrap().len(), expected);
        }
    }

    #[actix_web::test]
    async fn check_in_without_serial_id_is_rejected() {
        let pool = seeded_pool().await;
        let app = app!(pool);

        let bodies = [
            "".to_string(),
            "not json".to_string(),
            json!({}).to_string(),
            json!({ "serial": "S1" }).to_string(),
            json!({ "serial_id": null }).to_string(),
            json!(["S1"]).to_string(),
        ];

        for body in bodies {
            let req = test::TestRequest::post()
                .uri("/attendance")
                .insert_header(("content-type", "application/json"))
                .set_payload(body.clone())
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 400, "body {body:?}");

            let json: Value = test::read_body_json(resp).await;
            assert_eq!(json, json!({ "error": "Serial ID is required" }));
        }

        assert!(Attendance::for_student(&pool, 1).await.unwrap().is_empty());
    }

    #[::core::prelude::v1::test]
    fn serial_id_only_comes_from_a_json_object() {
        assert_eq!(
            CheckInRequest::serial_id_from(br#"{"serial_id": "S1"}"#).unwrap(),
            "S1"
        );

        for body in [
            &br#"["S1"]"#[..],
            br#""S1""#,
            br#"{"serial_id": 5}"#,
            br#"{"serial_id": null}"#,
            b"",
        ] {
            assert!(
                matches!(
                    CheckInRequest::serial_id_from(body),
                    Err(ApiError::MissingSerialId)
                ),
                "body {:?}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[actix_web::test]
    async fn array_body_with_valid_serial_records_nothing() {
        let pool = seeded_pool().await;
        let app = app!(pool);

        let req = test::TestRequest::post()
            .uri("/attendance")
            .set_json(json!(["S1"]))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Serial ID is required" }));
        assert!(Attendance::for_student(&pool, 1).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn check_in_with_unknown_serial_id_is_rejected() {
        let pool = seeded_pool().await;
        let app = app!(pool);

        for body in [
            json!({ "serial_id": "NOPE" }),
            json!({ "serial_id": "" }),
            json!({ "serial_id": "s1", "name": "Ann" }),
        ] {
            let req = test::TestRequest::post()
                .uri("/attendance")
                .set_json(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 400);

            let json: Value = test::read_body_json(resp).await;
            assert_eq!(json, json!({ "error": "Invalid Serial ID" }));
        }
    }

    #[actix_web::test]
    async fn other_methods_are_not_allowed() {
        let pool = seeded_pool().await;
        let app = app!(pool);

        for req in [
            test::TestRequest::delete().uri("/attendance").to_request(),
            test::TestRequest::put().uri("/attendance").to_request(),
            test::TestRequest::patch().uri("/attendance").to_request(),
        ] {
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 405);

            let json: Value = test::read_body_json(resp).await;
            assert_eq!(
                json,
                json!({ "error": "This endpoint only supports GET and POST requests" })
            );
        }
    }

    #[actix_web::test]
    async fn head_and_options_are_answered() {
        let pool = seeded_pool().await;
        let app = app!(pool);

        let req = test::TestRequest::default()
            .method(actix_web::http::Method::HEAD)
            .uri("/attendance")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let req = test::TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/attendance")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get(header::ALLOW).unwrap(),
            "GET, HEAD, OPTIONS, POST"
        );
    }

    #[actix_web::test]
    async fn unknown_student_is_not_found() {
        let pool = seeded_pool().await;
        let app = app!(pool);

        let req = test::TestRequest::get().uri("/attendance/99").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);

        let json: Value = test::read_body_json(resp).await;
        assert_eq!(json, json!({ "error": "Student not found" }));
    }

    #[actix_web::test]
    async fn student_without_records_is_not_found() {
        let pool = seeded_pool().await;
        let app = app!(pool);

        let req = test::TestRequest::get().uri("/attendance/1").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);

        let json: Value = test::read_body_json(resp).await;
        assert_eq!(json, json!({ "error": "No attendance records found" }));
    }

    #[actix_web::test]
    async fn non_numeric_student_id_does_not_match() {
        let pool = seeded_pool().await;
        let app = app!(pool);

        for uri in ["/attendance/abc", "/attendance/-1"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 404, "uri {uri}");
        }
    }

    #[actix_web::test]
    async fn check_in_then_read_back() {
        let pool = seeded_pool().await;
        let app = app!(pool);

        let req = test::TestRequest::post()
            .uri("/attendance")
            .set_json(json!({ "serial_id": "S1" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let today = Local::now().date_naive().format("%Y-%m-%d").to_string();

        let req = test::TestRequest::get().uri("/attendance/1").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let json: Value = test::read_body_json(resp).await;
        let records = json.as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["student_id"], 1);
        assert_eq!(records[0]["date"], today.as_str());

        let time = records[0]["time"].as_str().unwrap();
        assert!(chrono::NaiveTime::parse_from_str(time, "%H:%M:%S").is_ok());
        assert_eq!(time.len(), 8, "time should be HH:MM:SS, got {time}");
    }

    #[actix_web::test]
    async fn records_belong_to_their_student() {
        let pool = seeded_pool().await;
        Student::insert(&pool, "Bob", "S2").await.unwrap();
        let app = app!(pool);

        for serial in ["S1", "S2", "S2"] {
            let req = test::TestRequest::post()
                .uri("/attendance")
                .set_json(json!({ "serial_id": serial }))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), 201);
        }

        let req = test::TestRequest::get().uri("/attendance/2").to_request();
        let json: Value = test::call_and_read_body_json(&app, req).await;
        let records = json.as_array().unwrap();

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r["student_id"] == 2));
        assert!(records[0]["id"].as_i64() < records[1]["id"].as_i64());
    }
}
