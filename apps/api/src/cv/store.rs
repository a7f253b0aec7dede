use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::cv::{CvDocument, CvRow, CvSummaryRow, Template};

/// Inserts a new CV and returns the stored row.
pub async fn create_cv(
    pool: &PgPool,
    title: &str,
    template: Template,
    document: &CvDocument,
) -> Result<CvRow, sqlx::Error> {
    let row = sqlx::query_as::<_, CvRow>(
        r#"
        INSERT INTO cvs (id, title, template, data)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(template.as_str())
    .bind(document.to_value())
    .fetch_one(pool)
    .await?;

    info!("Created CV {} ({})", row.id, row.template);
    Ok(row)
}

pub async fn get_cv(pool: &PgPool, id: Uuid) -> Result<Option<CvRow>, sqlx::Error> {
    sqlx::query_as::<_, CvRow>("SELECT * FROM cvs WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Lists CVs without their payload, most recently edited first.
pub async fn list_cvs(pool: &PgPool) -> Result<Vec<CvSummaryRow>, sqlx::Error> {
    sqlx::query_as::<_, CvSummaryRow>(
        "SELECT id, title, template, updated_at FROM cvs ORDER BY updated_at DESC",
    )
    .fetch_all(pool)
    .await
}

/// Overwrites title, template and data. Returns `None` if the CV does not exist.
pub async fn update_cv(
    pool: &PgPool,
    id: Uuid,
    title: &str,
    template: Template,
    document: &CvDocument,
) -> Result<Option<CvRow>, sqlx::Error> {
    sqlx::query_as::<_, CvRow>(
        r#"
        UPDATE cvs
        SET title = $2, template = $3, data = $4, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(title)
    .bind(template.as_str())
    .bind(document.to_value())
    .fetch_optional(pool)
    .await
}

/// Returns `true` if a row was deleted.
pub async fn delete_cv(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cvs WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() > 0 {
        info!("Deleted CV {id}");
    }
    Ok(result.rows_affected() > 0)
}
