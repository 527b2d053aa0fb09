use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Serialize, Serializer};
use sqlx::{Executor, Sqlite};
use utoipa::ToSchema;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "date": "2024-09-02",
        "time": "08:57:13",
        "student_id": 1
    })
)]
pub struct Attendance {
    #[schema(example = 1)]
    pub id: i64,

    #[schema(example = "2024-09-02", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[serde(serialize_with = "serialize_time")]
    #[schema(example = "08:57:13", value_type = String)]
    pub time: NaiveTime,

    #[schema(example = 1)]
    pub student_id: i64,
}

fn serialize_time<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&time.format(TIME_FORMAT))
}

impl Attendance {
    /// Inserts a check-in stamped with `recorded_at`, truncated to whole seconds.
    pub async fn record<'e, E>(
        executor: E,
        student_id: i64,
        recorded_at: NaiveDateTime,
    ) -> Result<i64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result =
            sqlx::query("INSERT INTO attendance (date, time, student_id) VALUES (?, ?, ?)")
                .bind(recorded_at.format(DATE_FORMAT).to_string())
                .bind(recorded_at.format(TIME_FORMAT).to_string())
                .bind(student_id)
                .execute(executor)
                .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn for_student<'e, E>(
        executor: E,
        student_id: i64,
    ) -> Result<Vec<Attendance>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Attendance>(
            r#"
            SELECT id, date, time, student_id
            FROM attendance
            WHERE student_id = ?
            ORDER BY id
            "#,
        )
        .bind(student_id)
        .fetch_all(executor)
        .await
    }
}
