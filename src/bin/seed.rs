use shopai_api::{config::AppConfig, db::create_pool, services::auth_service::hash_password};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id =
        ensure_user(&pool, "admin@shopai.dev", "admin123", "Store Admin", "admin").await?;

    let demo_users = [
        ("john.doe@example.com", "John Doe"),
        ("jane.smith@example.com", "Jane Smith"),
        ("mike.wilson@example.com", "Mike Wilson"),
    ];
    for (email, full_name) in demo_users {
        ensure_user(&pool, email, "password123", full_name, "user").await?;
    }

    seed_products(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    full_name: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, full_name, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(full_name)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    // If the user already exists, fetch its id.
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = vec![
        (
            "Wireless Bluetooth Headphones",
            "Premium wireless headphones with active noise cancellation, 30-hour battery life, and crystal-clear sound quality.",
            199.99,
            "Electronics",
            "TechSound",
            50,
        ),
        (
            "Smart Fitness Watch",
            "Advanced fitness tracking with heart rate monitoring, GPS, sleep tracking, and 7-day battery life.",
            299.99,
            "Wearables",
            "FitTech",
            30,
        ),
        (
            "Mechanical Gaming Keyboard",
            "RGB mechanical keyboard with tactile switches, programmable keys, and durable construction for gaming.",
            149.99,
            "Gaming",
            "GamePro",
            25,
        ),
        (
            "Portable Bluetooth Speaker",
            "Waterproof portable speaker with 360-degree sound, 12-hour battery, and wireless connectivity.",
            79.99,
            "Audio",
            "SoundWave",
            40,
        ),
        (
            "Wireless Charging Pad",
            "Fast wireless charging pad compatible with all Qi-enabled devices, sleek design with LED indicator.",
            49.99,
            "Accessories",
            "ChargeTech",
            60,
        ),
        (
            "Smart Home Hub",
            "Central control hub for smart home devices with voice assistant integration and app control.",
            129.99,
            "Smart Home",
            "HomeAI",
            20,
        ),
        (
            "Gaming Mouse",
            "High-precision gaming mouse with customizable RGB lighting, programmable buttons, and ergonomic design.",
            89.99,
            "Gaming",
            "GamePro",
            35,
        ),
        (
            "Noise-Canceling Earbuds",
            "True wireless earbuds with active noise cancellation, 8-hour battery life, and premium sound quality.",
            179.99,
            "Audio",
            "SoundWave",
            55,
        ),
    ];

    for (name, description, price, category, brand, stock) in products {
        let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await?;
        if existing.is_some() {
            continue;
        }

        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, category, brand, image_url, stock_quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(category)
        .bind(brand)
        .bind("/placeholder-product.jpg")
        .bind(stock)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
