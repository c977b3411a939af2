use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use waypoint_core::repository::LocationStore;
use waypoint_core::{CoreError, CoreResult, Location, LocationCode, LocationKind};

pub struct PostgresLocationStore {
    pub pool: PgPool,
}

impl PostgresLocationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct LocationRow {
    iata_code: String,
    name: String,
    city: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
    latitude: f64,
    longitude: f64,
    #[sqlx(rename = "type")]
    kind: String,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LocationRow> for Location {
    type Error = CoreError;

    fn try_from(row: LocationRow) -> Result<Self, Self::Error> {
        Ok(Location {
            code: LocationCode::parse(&row.iata_code)?,
            name: row.name,
            city: row.city,
            country: row.country,
            country_code: row.country_code,
            latitude: row.latitude,
            longitude: row.longitude,
            kind: row.kind.parse().unwrap_or(LocationKind::Airport),
            updated_at: row.updated_at,
        })
    }
}

fn store_error(e: sqlx::Error) -> CoreError {
    CoreError::StoreUnavailable(e.to_string())
}

#[async_trait]
impl LocationStore for PostgresLocationStore {
    async fn get(&self, code: &LocationCode) -> CoreResult<Option<Location>> {
        let row = sqlx::query_as::<_, LocationRow>(
            r#"
            SELECT iata_code, name, city, country, country_code, latitude, longitude, type, updated_at
            FROM locations
            WHERE iata_code = $1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.map(Location::try_from).transpose()
    }

    async fn upsert(&self, location: &Location) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO locations (iata_code, name, city, country, country_code, latitude, longitude, type, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (iata_code)
            DO UPDATE SET
                name = EXCLUDED.name,
                city = EXCLUDED.city,
                country = EXCLUDED.country,
                country_code = EXCLUDED.country_code,
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                type = EXCLUDED.type,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(location.code.as_str())
        .bind(&location.name)
        .bind(location.city.as_deref())
        .bind(location.country.as_deref())
        .bind(location.country_code.as_deref())
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(location.kind.as_str())
        .bind(location.updated_at)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        debug!(code = %location.code, "Location upserted");
        Ok(())
    }
}
