//! User Repository

use super::RepoResult;
use shared::models::NewUser;
use sqlx::SqlitePool;

pub async fn insert(pool: &SqlitePool, data: &NewUser) -> RepoResult<()> {
    sqlx::query("INSERT INTO users (id, create_time) VALUES (?, ?)")
        .bind(data.id)
        .bind(data.create_time)
        .execute(pool)
        .await?;
    Ok(())
}

/// Users created in `[start, end)`; `start = None` counts everything before `end`
pub async fn count(pool: &SqlitePool, start: Option<i64>, end: i64) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users WHERE (?1 IS NULL OR create_time >= ?1) AND create_time < ?2",
    )
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await?;
    Ok(count)
}
