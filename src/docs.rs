use crate::api::attendance::{CheckInRequest, SuccessResponse};
use crate::api::error::ErrorResponse;
use crate::model::{attendance::Attendance, student::Student};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance API",
        version = "0.1.0",
        description = r#"
## Student Attendance

Badge-based check-in for pre-registered students.

- **POST /attendance** records a check-in for the student owning the given serial ID
- **GET /attendance** lists every student
- **GET /attendance/{student_id}** returns a student's check-in history

Errors are returned as `{"error": "<message>"}`.
"#,
    ),
    paths(
        crate::api::attendance::list_students,
        crate::api::attendance::check_in,
        crate::api::attendance::method_not_allowed,
        crate::api::attendance::get_student_attendance
    ),
    components(
        schemas(
            Student,
            Attendance,
            CheckInRequest,
            SuccessResponse,
            ErrorResponse
        )
    ),
    tags(
        (name = "Attendance", description = "Check-in and attendance history APIs"),
    )
)]
pub struct ApiDoc;
