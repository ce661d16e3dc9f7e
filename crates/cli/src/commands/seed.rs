//! Seed the catalog with demo data for local development.
//!
//! Inserts two warehouses, three base products, two packaging materials,
//! and one combo with its BOM and packaging requirements. Idempotent:
//! existing rows are left untouched.

use secrecy::SecretString;
use sqlx::PgPool;
use tracing::info;

use packhouse_server::db;

/// Run the seed command.
///
/// # Errors
///
/// Returns an error if the database URL is missing or an insert fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("PACKHOUSE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "PACKHOUSE_DATABASE_URL not set")?;

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    seed_catalog(&pool).await?;

    info!("Seeding complete!");
    Ok(())
}

async fn seed_catalog(pool: &PgPool) -> Result<(), sqlx::Error> {
    let warehouses = sqlx::query(
        r"
        INSERT INTO warehouse (name)
        VALUES ('Main DC'), ('Overflow DC')
        ON CONFLICT (name) DO NOTHING
        ",
    )
    .execute(pool)
    .await?
    .rows_affected();
    info!(inserted = warehouses, "Warehouses seeded");

    let products = sqlx::query(
        r"
        INSERT INTO product (sku, name, kind)
        VALUES
            ('TEA-GREEN-250', 'Green Tea 250g', 'product'),
            ('TEA-BLACK-250', 'Black Tea 250g', 'product'),
            ('TEA-OOLONG-250', 'Oolong Tea 250g', 'product'),
            ('PKG-TIN-SMALL', 'Small Gift Tin', 'packaging'),
            ('PKG-BOX-DUO', 'Duo Gift Box', 'packaging')
        ON CONFLICT (sku) DO NOTHING
        ",
    )
    .execute(pool)
    .await?
    .rows_affected();
    info!(inserted = products, "Products seeded");

    // Each loose tea consumes one small tin when packaged.
    let requirements = sqlx::query(
        r"
        INSERT INTO packaging_requirement (product_id, packaging_id, quantity)
        SELECT p.id, pkg.id, 1
        FROM product p
        JOIN product pkg ON pkg.sku = 'PKG-TIN-SMALL'
        WHERE p.sku IN ('TEA-GREEN-250', 'TEA-BLACK-250', 'TEA-OOLONG-250')
        ON CONFLICT (product_id, packaging_id) DO NOTHING
        ",
    )
    .execute(pool)
    .await?
    .rows_affected();
    info!(inserted = requirements, "Packaging requirements seeded");

    let combos = sqlx::query(
        r"
        INSERT INTO combo_product (sku, name)
        VALUES ('COMBO-DUO', 'Green & Black Duo')
        ON CONFLICT (sku) DO NOTHING
        ",
    )
    .execute(pool)
    .await?
    .rows_affected();
    info!(inserted = combos, "Combo products seeded");

    let components = sqlx::query(
        r"
        INSERT INTO combo_component (combo_product_id, product_id, quantity)
        SELECT c.id, p.id, 1
        FROM combo_product c
        JOIN product p ON p.sku IN ('TEA-GREEN-250', 'TEA-BLACK-250')
        WHERE c.sku = 'COMBO-DUO'
        ON CONFLICT (combo_product_id, product_id) DO NOTHING
        ",
    )
    .execute(pool)
    .await?
    .rows_affected();
    info!(inserted = components, "Combo components seeded");

    let combo_packaging = sqlx::query(
        r"
        INSERT INTO combo_packaging_requirement (combo_product_id, packaging_id, quantity)
        SELECT c.id, pkg.id, 1
        FROM combo_product c
        JOIN product pkg ON pkg.sku = 'PKG-BOX-DUO'
        WHERE c.sku = 'COMBO-DUO'
        ON CONFLICT (combo_product_id, packaging_id) DO NOTHING
        ",
    )
    .execute(pool)
    .await?
    .rows_affected();
    info!(inserted = combo_packaging, "Combo packaging requirements seeded");

    Ok(())
}
