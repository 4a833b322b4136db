use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Executor, QueryBuilder, Row, Sqlite};

use super::listing::{ListingQuery, Page, Pagination};
use super::models::{
    Brand, CarModel, CatalogImport, ModelSummary, ModelWithBrand, SearchEntry, Status, Variant,
};
use super::store::{CatalogStore, ImportSummary};
use super::model_slug;
use crate::search::tokenizer::query_terms;

const MODEL_COLUMNS: &str = "m.id, m.brand_id, m.name, m.status, m.is_popular, m.is_new, \
     m.popular_rank, m.new_rank, m.body_type, m.launch_date, m.fuel_types, m.transmissions, m.hero_image";

const VARIANT_COLUMNS: &str = "id, brand_id, model_id, name, price, status, fuel_type, transmission";

/// SQLite-backed catalog
#[derive(Clone)]
pub struct SqliteCatalogStore {
    pool: SqlitePool,
}

impl SqliteCatalogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalogStore {
    async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_brands(&self, include_inactive: bool) -> Result<Vec<Brand>, sqlx::Error> {
        let sql = if include_inactive {
            "SELECT id, name, logo, ranking, status FROM brands
             ORDER BY ranking = 0, ranking ASC, name COLLATE NOCASE ASC"
        } else {
            "SELECT id, name, logo, ranking, status FROM brands WHERE status = 'active'
             ORDER BY ranking = 0, ranking ASC, name COLLATE NOCASE ASC"
        };

        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        rows.iter().map(brand_from_row).collect()
    }

    async fn get_brand(&self, id: &str) -> Result<Option<Brand>, sqlx::Error> {
        let row = sqlx::query("SELECT id, name, logo, ranking, status FROM brands WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(brand_from_row).transpose()
    }

    async fn list_models(&self, brand_id: Option<&str>) -> Result<Vec<CarModel>, sqlx::Error> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM models m", MODEL_COLUMNS));
        if let Some(brand_id) = brand_id {
            qb.push(" WHERE m.brand_id = ");
            qb.push_bind(brand_id);
        }
        qb.push(" ORDER BY m.name COLLATE NOCASE ASC, m.id ASC");

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(model_from_row).collect()
    }

    async fn get_model(&self, id: &str) -> Result<Option<CarModel>, sqlx::Error> {
        let row = sqlx::query(&format!("SELECT {} FROM models m WHERE m.id = ?", MODEL_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(model_from_row).transpose()
    }

    async fn list_variants(
        &self,
        model_id: Option<&str>,
        brand_id: Option<&str>,
    ) -> Result<Vec<Variant>, sqlx::Error> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM variants WHERE 1 = 1", VARIANT_COLUMNS));
        if let Some(model_id) = model_id {
            qb.push(" AND model_id = ");
            qb.push_bind(model_id);
        }
        if let Some(brand_id) = brand_id {
            qb.push(" AND brand_id = ");
            qb.push_bind(brand_id);
        }
        qb.push(" ORDER BY price ASC, name COLLATE NOCASE ASC");

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(variant_from_row).collect()
    }

    async fn get_variant(&self, id: &str) -> Result<Option<Variant>, sqlx::Error> {
        let row = sqlx::query(&format!("SELECT {} FROM variants WHERE id = ?", VARIANT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(variant_from_row).transpose()
    }

    async fn active_variants_for_models(&self, model_ids: &[String]) -> Result<Vec<Variant>, sqlx::Error> {
        if model_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM variants WHERE status = 'active' AND model_id IN (",
            VARIANT_COLUMNS
        ));
        let mut ids = qb.separated(", ");
        for id in model_ids {
            ids.push_bind(id.as_str());
        }
        ids.push_unseparated(")");
        qb.push(" ORDER BY price ASC, name COLLATE NOCASE ASC");

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(variant_from_row).collect()
    }

    async fn active_models_with_brands(&self) -> Result<Vec<ModelWithBrand>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT m.id, m.name, b.name AS brand_name, m.hero_image
             FROM models m
             JOIN brands b ON b.id = m.brand_id
             WHERE m.status = 'active'
             ORDER BY m.name COLLATE NOCASE ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(model_with_brand_from_row).collect()
    }

    async fn search_models(&self, query: &str, limit: usize) -> Result<Vec<SearchEntry>, sqlx::Error> {
        let terms = query_terms(query);
        if terms.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let full = query.trim().to_lowercase();

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT m.id, m.name, b.name AS brand_name, m.hero_image
             FROM models m
             JOIN brands b ON b.id = m.brand_id
             WHERE m.status = 'active'",
        );
        for term in &terms {
            qb.push(" AND LOWER(b.name || ' ' || m.name) LIKE ");
            qb.push_bind(format!("%{}%", escape_like(term)));
            qb.push(" ESCAPE '\\'");
        }
        qb.push(" ORDER BY (LOWER(m.name) LIKE ");
        qb.push_bind(format!("{}%", escape_like(&full)));
        qb.push(" ESCAPE '\\' OR LOWER(b.name) LIKE ");
        qb.push_bind(format!("{}%", escape_like(&full)));
        qb.push(" ESCAPE '\\') DESC, m.name COLLATE NOCASE ASC LIMIT ");
        qb.push_bind(limit as i64);

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| model_with_brand_from_row(row).map(SearchEntry::from))
            .collect()
    }

    async fn list_model_summaries(&self, query: &ListingQuery) -> Result<Page<ModelSummary>, sqlx::Error> {
        let total: i64 = query
            .count_builder()
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let rows = query.select_builder().build().fetch_all(&self.pool).await?;
        let data = rows
            .iter()
            .map(summary_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            data,
            pagination: Pagination::new(query.page, query.limit, total.max(0) as u64),
        })
    }

    async fn upsert_brand(&self, brand: &Brand) -> Result<(), sqlx::Error> {
        write_brand(&self.pool, brand).await
    }

    async fn upsert_model(&self, model: &CarModel) -> Result<(), sqlx::Error> {
        write_model(&self.pool, model).await
    }

    async fn upsert_variant(&self, variant: &Variant) -> Result<(), sqlx::Error> {
        write_variant(&self.pool, variant).await
    }

    async fn delete_brand(&self, id: &str) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM variants WHERE brand_id = ? OR model_id IN (SELECT id FROM models WHERE brand_id = ?)")
            .bind(id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM models WHERE brand_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM brands WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_model(&self, id: &str) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM variants WHERE model_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM models WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_variant(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM variants WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn import(&self, batch: &CatalogImport) -> Result<ImportSummary, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        for brand in &batch.brands {
            write_brand(&mut *tx, brand).await?;
        }
        for model in &batch.models {
            write_model(&mut *tx, model).await?;
        }
        for variant in &batch.variants {
            write_variant(&mut *tx, variant).await?;
        }

        tx.commit().await?;

        Ok(ImportSummary {
            brands: batch.brands.len(),
            models: batch.models.len(),
            variants: batch.variants.len(),
        })
    }
}

async fn write_brand<'e, E>(executor: E, brand: &Brand) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO brands (id, name, logo, ranking, status) VALUES (?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name, logo = excluded.logo,
            ranking = excluded.ranking, status = excluded.status",
    )
    .bind(&brand.id)
    .bind(&brand.name)
    .bind(&brand.logo)
    .bind(brand.ranking)
    .bind(brand.status.as_str())
    .execute(executor)
    .await?;
    Ok(())
}

async fn write_model<'e, E>(executor: E, model: &CarModel) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let fuel_types = serde_json::to_string(&model.fuel_types).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
    let transmissions =
        serde_json::to_string(&model.transmissions).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

    sqlx::query(
        "INSERT INTO models (id, brand_id, name, status, is_popular, is_new, popular_rank, new_rank,
                             body_type, launch_date, fuel_types, transmissions, hero_image)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
            brand_id = excluded.brand_id, name = excluded.name, status = excluded.status,
            is_popular = excluded.is_popular, is_new = excluded.is_new,
            popular_rank = excluded.popular_rank, new_rank = excluded.new_rank,
            body_type = excluded.body_type, launch_date = excluded.launch_date,
            fuel_types = excluded.fuel_types, transmissions = excluded.transmissions,
            hero_image = excluded.hero_image",
    )
    .bind(&model.id)
    .bind(&model.brand_id)
    .bind(&model.name)
    .bind(model.status.as_str())
    .bind(i64::from(model.is_popular))
    .bind(i64::from(model.is_new))
    .bind(model.popular_rank)
    .bind(model.new_rank)
    .bind(&model.body_type)
    .bind(&model.launch_date)
    .bind(fuel_types)
    .bind(transmissions)
    .bind(&model.hero_image)
    .execute(executor)
    .await?;
    Ok(())
}

async fn write_variant<'e, E>(executor: E, variant: &Variant) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO variants (id, brand_id, model_id, name, price, status, fuel_type, transmission)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
            brand_id = excluded.brand_id, model_id = excluded.model_id, name = excluded.name,
            price = excluded.price, status = excluded.status,
            fuel_type = excluded.fuel_type, transmission = excluded.transmission",
    )
    .bind(&variant.id)
    .bind(&variant.brand_id)
    .bind(&variant.model_id)
    .bind(&variant.name)
    .bind(variant.price)
    .bind(variant.status.as_str())
    .bind(&variant.fuel_type)
    .bind(&variant.transmission)
    .execute(executor)
    .await?;
    Ok(())
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

fn json_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

fn brand_from_row(row: &SqliteRow) -> Result<Brand, sqlx::Error> {
    Ok(Brand {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        logo: row.try_get("logo")?,
        ranking: row.try_get("ranking")?,
        status: Status::parse(row.try_get("status")?),
    })
}

fn model_from_row(row: &SqliteRow) -> Result<CarModel, sqlx::Error> {
    let is_popular: i64 = row.try_get("is_popular")?;
    let is_new: i64 = row.try_get("is_new")?;
    let fuel_types: String = row.try_get("fuel_types")?;
    let transmissions: String = row.try_get("transmissions")?;

    Ok(CarModel {
        id: row.try_get("id")?,
        brand_id: row.try_get("brand_id")?,
        name: row.try_get("name")?,
        status: Status::parse(row.try_get("status")?),
        is_popular: is_popular != 0,
        is_new: is_new != 0,
        popular_rank: row.try_get("popular_rank")?,
        new_rank: row.try_get("new_rank")?,
        body_type: row.try_get("body_type")?,
        launch_date: row.try_get("launch_date")?,
        fuel_types: json_list(&fuel_types),
        transmissions: json_list(&transmissions),
        hero_image: row.try_get("hero_image")?,
    })
}

fn variant_from_row(row: &SqliteRow) -> Result<Variant, sqlx::Error> {
    Ok(Variant {
        id: row.try_get("id")?,
        brand_id: row.try_get("brand_id")?,
        model_id: row.try_get("model_id")?,
        name: row.try_get("name")?,
        price: row.try_get("price")?,
        status: Status::parse(row.try_get("status")?),
        fuel_type: row.try_get("fuel_type")?,
        transmission: row.try_get("transmission")?,
    })
}

fn model_with_brand_from_row(row: &SqliteRow) -> Result<ModelWithBrand, sqlx::Error> {
    Ok(ModelWithBrand {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        brand_name: row.try_get("brand_name")?,
        hero_image: row.try_get("hero_image")?,
    })
}

fn summary_from_row(row: &SqliteRow) -> Result<ModelSummary, sqlx::Error> {
    let model = model_from_row(row)?;
    let brand_name: String = row.try_get("brand_name")?;
    let slug = model_slug(&brand_name, &model.name);

    Ok(ModelSummary {
        model,
        brand_name,
        slug,
        lowest_price: row.try_get("lowest_price")?,
        highest_price: row.try_get("highest_price")?,
        variant_count: row.try_get("variant_count")?,
        lowest_price_fuel_type: row.try_get("lowest_price_fuel_type")?,
    })
}
