use serde::Serialize;
use sqlx::{Executor, Sqlite};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Ann",
        "serial_id": "S1"
    })
)]
pub struct Student {
    #[schema(example = 1)]
    pub id: i64,

    #[schema(example = "Ann")]
    pub name: String,

    /// Badge/card code presented at check-in.
    #[schema(example = "S1")]
    pub serial_id: String,
}

impl Student {
    /// All students in storage order.
    pub async fn all<'e, E>(executor: E) -> Result<Vec<Student>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Student>("SELECT id, name, serial_id FROM student")
            .fetch_all(executor)
            .await
    }

    pub async fn find<'e, E>(executor: E, id: i64) -> Result<Option<Student>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Student>("SELECT id, name, serial_id FROM student WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Exact, case-sensitive match on the serial code.
    pub async fn find_by_serial<'e, E>(
        executor: E,
        serial_id: &str,
    ) -> Result<Option<Student>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Student>(
            "SELECT id, name, serial_id FROM student WHERE serial_id = ? LIMIT 1",
        )
        .bind(serial_id)
        .fetch_optional(executor)
        .await
    }

    pub async fn insert<'e, E>(
        executor: E,
        name: &str,
        serial_id: &str,
    ) -> Result<Student, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("INSERT INTO student (name, serial_id) VALUES (?, ?)")
            .bind(name)
            .bind(serial_id)
            .execute(executor)
            .await?;

        Ok(Student {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            serial_id: serial_id.to_string(),
        })
    }
}
