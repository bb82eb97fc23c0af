use chrono::{Duration, Utc};
use theater_booking_api::{
    config::AppConfig,
    db::{create_pool, orm_from_pool, run_migrations},
    services::auth_service::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    run_migrations(&orm_from_pool(pool.clone())).await?;

    let admin_id = ensure_account(&pool, "Admin", "admin@example.com", "admin123", "admin").await?;
    let user_id = ensure_account(&pool, "Demo User", "user@example.com", "user123", "user").await?;
    seed_shows(&pool, admin_id).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_account(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, role, booking_ids, created_at)
        VALUES ($1, $2, $3, $4, $5, '[]'::jsonb, $6)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    println!("Ensured account {email} (role={role})");
    Ok(id)
}

async fn seed_shows(pool: &sqlx::PgPool, admin_id: Uuid) -> anyhow::Result<()> {
    let shows = [
        (
            "Hamlet",
            "The prince of Denmark seeks revenge.",
            "Ana Ruiz",
            "Drama",
            180,
            "Main Hall",
            120,
            2500_i64,
            vec!["Lucas Vidal", "Marta Sanz"],
        ),
        (
            "The Importance of Being Earnest",
            "A trivial comedy for serious people.",
            "Pablo Gil",
            "Comedy",
            140,
            "Studio",
            60,
            1800,
            vec!["Irene Mora", "Tomás León"],
        ),
    ];

    for (title, description, director, genre, duration, room, seats, price, actors) in shows {
        let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM shows WHERE title = $1")
            .bind(title)
            .fetch_optional(pool)
            .await?;
        if existing.is_some() {
            continue;
        }

        let show_id = Uuid::new_v4();
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO shows (
                id, title, description, director, genre, duration_minutes, room,
                total_seats, price, poster, actors, average_rating, rating_count,
                admin_id, booking_ids, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NULL, $10, 0, 0, $11, '[]'::jsonb, $12, $12)
            "#,
        )
        .bind(show_id)
        .bind(title)
        .bind(description)
        .bind(director)
        .bind(genre)
        .bind(duration)
        .bind(room)
        .bind(seats)
        .bind(price)
        .bind(serde_json::json!(actors))
        .bind(admin_id)
        .bind(now)
        .execute(pool)
        .await?;

        for position in 0..3_i32 {
            let starts_at = now + Duration::days(i64::from(position) * 7 + 3);
            sqlx::query(
                "INSERT INTO showtimes (id, show_id, starts_at, position) VALUES ($1, $2, $3, $4)",
            )
            .bind(Uuid::new_v4())
            .bind(show_id)
            .bind(starts_at)
            .bind(position)
            .execute(pool)
            .await?;
        }
        println!("Seeded show {title}");
    }

    Ok(())
}
