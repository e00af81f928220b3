use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::AnalysisResult;
use crate::models::{FeedbackRecord, MealEntry, MealType};
use crate::store::FeedbackStore;

/// Postgres-backed feedback store.
#[derive(Clone)]
pub struct PgFeedbackStore {
    pool: PgPool,
}

impl PgFeedbackStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &AppConfig) -> AnalysisResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn ping(&self) -> AnalysisResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl FeedbackStore for PgFeedbackStore {
    #[tracing::instrument(skip(self))]
    async fn count_students(&self, exclude_admins: bool) -> AnalysisResult<i64> {
        let count: i64 = sqlx::query(
            "SELECT COUNT(*) AS total FROM mess_feedback.students \
             WHERE NOT ($1 AND is_admin)",
        )
        .bind(exclude_admins)
        .fetch_one(&self.pool)
        .await?
        .get("total");

        Ok(count)
    }

    #[tracing::instrument(skip(self))]
    async fn query_feedback(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AnalysisResult<Vec<FeedbackRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT f.id AS feedback_id, f.student_id, f.feedback_date,
                   m.meal_type, m.rating, m.comment
            FROM mess_feedback.feedbacks f
            LEFT JOIN mess_feedback.feedback_meals m ON m.feedback_id = f.id
            WHERE f.feedback_date >= $1 AND f.feedback_date < $2
            ORDER BY f.submitted_at, f.id
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        let mut records: Vec<(Uuid, FeedbackRecord)> = Vec::new();

        for row in rows {
            let feedback_id: Uuid = row.get("feedback_id");

            let starts_new = records.last().map(|(id, _)| *id) != Some(feedback_id);
            if starts_new {
                records.push((
                    feedback_id,
                    FeedbackRecord::new(row.get("student_id"), row.get("feedback_date")),
                ));
            }

            let meal_type: Option<String> = row.get("meal_type");
            let Some(meal_type) = meal_type else {
                continue;
            };
            let meal: MealType = meal_type.parse()?;
            let rating: Option<i16> = row.get("rating");

            if let Some((_, record)) = records.last_mut() {
                record.meals[meal] = MealEntry {
                    rating: rating.map(i32::from),
                    comment: row.get("comment"),
                };
            }
        }

        debug!(records = records.len(), "feedback records loaded");
        Ok(records.into_iter().map(|(_, record)| record).collect())
    }
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

async fn upsert_student(
    pool: &PgPool,
    full_name: &str,
    email: &str,
    is_admin: bool,
) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO mess_feedback.students (id, full_name, email, is_admin)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE
        SET full_name = EXCLUDED.full_name, is_admin = EXCLUDED.is_admin
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(full_name)
    .bind(email)
    .bind(is_admin)
    .fetch_one(pool)
    .await?
    .get("id");

    Ok(id)
}

async fn upsert_feedback(pool: &PgPool, student_id: Uuid, date: NaiveDate) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO mess_feedback.feedbacks (id, student_id, feedback_date)
        VALUES ($1, $2, $3)
        ON CONFLICT (student_id, feedback_date) DO UPDATE
        SET feedback_date = EXCLUDED.feedback_date
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(student_id)
    .bind(date)
    .fetch_one(pool)
    .await?
    .get("id");

    Ok(id)
}

async fn upsert_meal(
    pool: &PgPool,
    feedback_id: Uuid,
    meal: MealType,
    rating: Option<i16>,
    comment: Option<&str>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO mess_feedback.feedback_meals (feedback_id, meal_type, rating, comment)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (feedback_id, meal_type) DO UPDATE
        SET rating = EXCLUDED.rating, comment = EXCLUDED.comment
        "#,
    )
    .bind(feedback_id)
    .bind(meal.key())
    .bind(rating)
    .bind(comment)
    .execute(pool)
    .await?;

    Ok(())
}

/// Inserts demo students and one day of feedback for `date`. Returns meals written.
pub async fn seed(pool: &PgPool, date: NaiveDate) -> anyhow::Result<usize> {
    upsert_student(pool, "Mess Warden", "warden@hostel.example.edu", true).await?;

    let students = [
        ("Aarav Sharma", "aarav.sharma@hostel.example.edu"),
        ("Diya Menon", "diya.menon@hostel.example.edu"),
        ("Kabir Singh", "kabir.singh@hostel.example.edu"),
        ("Meera Iyer", "meera.iyer@hostel.example.edu"),
        ("Rohan Das", "rohan.das@hostel.example.edu"),
    ];

    let feedback: [&[(MealType, i16, Option<&str>)]; 4] = [
        &[
            (MealType::Morning, 5, Some("Fresh idli and hot sambar")),
            (MealType::Afternoon, 3, None),
            (MealType::Evening, 2, Some("Rotis were cold")),
        ],
        &[
            (MealType::Morning, 4, Some("Good poha")),
            (MealType::Afternoon, 2, Some("Dal was too salty")),
            (MealType::Night, 4, None),
        ],
        &[
            (MealType::Morning, 4, None),
            (MealType::Afternoon, 3, Some("Rice okay, sabzi bland")),
            (MealType::Evening, 4, Some("Paneer was tasty")),
            (MealType::Night, 5, Some("Loved the maggi")),
        ],
        &[(MealType::Evening, 1, Some("Undercooked chicken, felt sick"))],
    ];

    let mut written = 0usize;

    for (index, (full_name, email)) in students.iter().enumerate() {
        let student_id = upsert_student(pool, full_name, email, false).await?;

        let Some(meals) = feedback.get(index) else {
            continue;
        };
        let feedback_id = upsert_feedback(pool, student_id, date).await?;

        for (meal, rating, comment) in meals.iter() {
            upsert_meal(pool, feedback_id, *meal, Some(*rating), *comment).await?;
            written += 1;
        }
    }

    info!(%date, written, "seed feedback inserted");
    Ok(written)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        email: String,
        full_name: String,
        date: NaiveDate,
        meal: String,
        rating: Option<i16>,
        comment: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut imported = 0usize;

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("malformed CSV row {}", line + 1))?;
        let meal: MealType = row.meal.parse()?;

        if let Some(rating) = row.rating {
            anyhow::ensure!(
                (1..=5).contains(&rating),
                "row {}: rating {rating} is outside 1..=5",
                line + 1
            );
        }

        let student_id = upsert_student(pool, &row.full_name, &row.email, false).await?;
        let feedback_id = upsert_feedback(pool, student_id, row.date).await?;
        upsert_meal(pool, feedback_id, meal, row.rating, row.comment.as_deref()).await?;
        imported += 1;
    }

    info!(imported, path = %csv_path.display(), "CSV import complete");
    Ok(imported)
}
