//! Model listings with variant pricing
//!
//! Every listing endpoint (models with pricing, cars by budget, popular cars,
//! compare) goes through [`ListingQuery`]: active models, left-joined with their
//! active priced variants, grouped per model to get min/max price and variant
//! count, then filtered, sorted and paginated in one statement.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{QueryBuilder, Sqlite};
use std::ops::Bound;

use crate::error::AppError;

pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Name,
    PriceAsc,
    PriceDesc,
    Popular,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "name" => Some(Self::Name),
            "price-asc" | "price_asc" => Some(Self::PriceAsc),
            "price-desc" | "price_desc" => Some(Self::PriceDesc),
            "popular" => Some(Self::Popular),
            _ => None,
        }
    }
}

/// Filters, ordering and paging for a model listing
#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    pub brand_id: Option<String>,
    /// Restrict to these model ids (empty means no restriction)
    pub ids: Vec<String>,
    /// Bounds on the lowest variant price
    pub min_price: Bound<f64>,
    pub max_price: Bound<f64>,
    pub fuel_type: Option<String>,
    pub body_type: Option<String>,
    pub popular_only: bool,
    pub new_only: bool,
    pub sort: SortOrder,
    /// 1-based
    pub page: u32,
    pub limit: u32,
    pub fields: Option<Vec<String>>,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            brand_id: None,
            ids: Vec::new(),
            min_price: Bound::Unbounded,
            max_price: Bound::Unbounded,
            fuel_type: None,
            body_type: None,
            popular_only: false,
            new_only: false,
            sort: SortOrder::Name,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            fields: None,
        }
    }
}

/// Query string accepted by the listing endpoints
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingParams {
    pub brand_id: Option<String>,
    pub fuel_type: Option<String>,
    pub body_type: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub fields: Option<String>,
}

impl ListingParams {
    pub fn into_query(self) -> Result<ListingQuery, AppError> {
        let sort = match self.sort.as_deref() {
            None | Some("") => SortOrder::Name,
            Some(value) => SortOrder::parse(value)
                .ok_or_else(|| AppError::InvalidInput(format!("Unknown sort order '{}'", value)))?,
        };

        if self.page == Some(0) {
            return Err(AppError::InvalidInput("page must be at least 1".to_string()));
        }

        Ok(ListingQuery {
            brand_id: non_empty(self.brand_id),
            fuel_type: non_empty(self.fuel_type),
            body_type: non_empty(self.body_type),
            sort,
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            fields: parse_fields(self.fields.as_deref()),
            ..ListingQuery::default()
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `"id, name,lowestPrice"` -> `["id", "name", "lowestPrice"]`
pub fn parse_fields(fields: Option<&str>) -> Option<Vec<String>> {
    let fields: Vec<String> = fields?
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(String::from)
        .collect();

    if fields.is_empty() {
        None
    } else {
        Some(fields)
    }
}

const SUMMARY_COLUMNS: &str = "SELECT m.id, m.brand_id, m.name, m.status, m.is_popular, m.is_new, \
     m.popular_rank, m.new_rank, m.body_type, m.launch_date, m.fuel_types, m.transmissions, \
     m.hero_image, b.name AS brand_name, \
     COALESCE(MIN(v.price), 0.0) AS lowest_price, \
     COALESCE(MAX(v.price), 0.0) AS highest_price, \
     COUNT(v.id) AS variant_count, \
     COALESCE((SELECT lv.fuel_type FROM variants lv \
        WHERE lv.model_id = m.id AND lv.status = 'active' AND lv.price > 0 AND lv.fuel_type IS NOT NULL \
        ORDER BY lv.price ASC, lv.id ASC LIMIT 1), 'Petrol') AS lowest_price_fuel_type";

impl ListingQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Page of summaries
    pub fn select_builder(&self) -> QueryBuilder<'_, Sqlite> {
        let mut qb = QueryBuilder::new(SUMMARY_COLUMNS);
        self.push_grouped_source(&mut qb);
        self.push_order(&mut qb);
        qb.push(" LIMIT ");
        qb.push_bind(i64::from(self.limit));
        qb.push(" OFFSET ");
        qb.push_bind(self.offset() as i64);
        qb
    }

    /// Total number of matching models, ignoring pagination
    pub fn count_builder(&self) -> QueryBuilder<'_, Sqlite> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM (SELECT m.id");
        self.push_grouped_source(&mut qb);
        qb.push(")");
        qb
    }

    fn push_grouped_source<'a>(&'a self, qb: &mut QueryBuilder<'a, Sqlite>) {
        qb.push(
            " FROM models m \
              JOIN brands b ON b.id = m.brand_id \
              LEFT JOIN variants v ON v.model_id = m.id AND v.status = 'active' AND v.price > 0 \
              WHERE m.status = 'active'",
        );

        if let Some(brand_id) = &self.brand_id {
            qb.push(" AND m.brand_id = ");
            qb.push_bind(brand_id.as_str());
        }

        if !self.ids.is_empty() {
            qb.push(" AND m.id IN (");
            let mut ids = qb.separated(", ");
            for id in &self.ids {
                ids.push_bind(id.as_str());
            }
            ids.push_unseparated(")");
        }

        if let Some(fuel_type) = &self.fuel_type {
            qb.push(
                " AND (EXISTS (SELECT 1 FROM variants fv WHERE fv.model_id = m.id \
                  AND fv.status = 'active' AND LOWER(fv.fuel_type) = LOWER(",
            );
            qb.push_bind(fuel_type.as_str());
            qb.push(")) OR LOWER(m.fuel_types) LIKE ");
            qb.push_bind(format!("%\"{}\"%", fuel_type.to_lowercase()));
            qb.push(")");
        }

        if let Some(body_type) = &self.body_type {
            qb.push(" AND LOWER(m.body_type) = LOWER(");
            qb.push_bind(body_type.as_str());
            qb.push(")");
        }

        if self.popular_only {
            qb.push(" AND m.is_popular = 1");
        }

        if self.new_only {
            qb.push(" AND m.is_new = 1");
        }

        qb.push(" GROUP BY m.id");

        let lower = match self.min_price {
            Bound::Included(v) => Some((">=", v)),
            Bound::Excluded(v) => Some((">", v)),
            Bound::Unbounded => None,
        };
        let upper = match self.max_price {
            Bound::Included(v) => Some(("<=", v)),
            Bound::Excluded(v) => Some(("<", v)),
            Bound::Unbounded => None,
        };
        for (i, (op, value)) in lower.into_iter().chain(upper).enumerate() {
            qb.push(if i == 0 { " HAVING MIN(v.price) " } else { " AND MIN(v.price) " });
            qb.push(op);
            qb.push(" ");
            qb.push_bind(value);
        }
    }

    fn push_order(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        let order = match self.sort {
            SortOrder::Name => " ORDER BY m.name COLLATE NOCASE ASC, m.id ASC",
            // unpriced models last
            SortOrder::PriceAsc => {
                " ORDER BY MIN(v.price) IS NULL, MIN(v.price) ASC, m.name COLLATE NOCASE ASC, m.id ASC"
            }
            SortOrder::PriceDesc => " ORDER BY MIN(v.price) DESC, m.name COLLATE NOCASE ASC, m.id ASC",
            SortOrder::Popular => {
                " ORDER BY m.is_popular DESC, m.popular_rank IS NULL, m.popular_rank ASC, \
                 m.name COLLATE NOCASE ASC, m.id ASC"
            }
        };
        qb.push(order);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
    pub has_more: bool,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let limit = limit.max(1);
        let total_pages = total.div_ceil(u64::from(limit));
        Self {
            page,
            limit,
            total,
            total_pages,
            has_more: u64::from(page) < total_pages,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T: Serialize> Page<T> {
    /// Serialize items, keeping only `fields` when given
    pub fn project(self, fields: Option<&[String]>) -> Result<Page<Value>, serde_json::Error> {
        let data = self
            .data
            .iter()
            .map(|item| project_value(serde_json::to_value(item)?, fields))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            data,
            pagination: self.pagination,
        })
    }
}

pub fn project_value(value: Value, fields: Option<&[String]>) -> Result<Value, serde_json::Error> {
    match (value, fields) {
        (Value::Object(mut map), Some(fields)) => {
            map.retain(|key, _| fields.iter().any(|f| f == key));
            Ok(Value::Object(map))
        }
        (value, _) => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pagination_math() {
        let p = Pagination::new(1, 20, 45);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_more);

        let last = Pagination::new(3, 20, 45);
        assert!(!last.has_more);

        let empty = Pagination::new(1, 20, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_more);
    }

    #[test]
    fn test_params_clamp_limit_and_parse_sort() {
        let query = ListingParams {
            sort: Some("price-desc".to_string()),
            limit: Some(500),
            fields: Some("id, name,,lowestPrice".to_string()),
            brand_id: Some("  ".to_string()),
            ..Default::default()
        }
        .into_query()
        .unwrap();

        assert_eq!(query.sort, SortOrder::PriceDesc);
        assert_eq!(query.limit, MAX_PAGE_SIZE);
        assert_eq!(query.brand_id, None);
        assert_eq!(
            query.fields,
            Some(vec!["id".to_string(), "name".to_string(), "lowestPrice".to_string()])
        );
    }

    #[test]
    fn test_params_reject_bad_sort_and_page() {
        let bad_sort = ListingParams {
            sort: Some("random".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad_sort.into_query(), Err(AppError::InvalidInput(_))));

        let bad_page = ListingParams {
            page: Some(0),
            ..Default::default()
        };
        assert!(bad_page.into_query().is_err());
    }

    #[test]
    fn test_builders_share_filters() {
        let query = ListingQuery {
            brand_id: Some("b1".to_string()),
            ids: vec!["m1".to_string(), "m2".to_string()],
            min_price: Bound::Included(100_000.0),
            max_price: Bound::Included(800_000.0),
            fuel_type: Some("Diesel".to_string()),
            ..ListingQuery::default()
        };

        let select_builder = query.select_builder();
        let count_builder = query.count_builder();
        let select = select_builder.sql();
        let count = count_builder.sql();

        for sql in [select, count] {
            assert!(sql.contains("m.brand_id = ?"));
            assert!(sql.contains("m.id IN (?, ?)"));
            assert!(sql.contains("HAVING MIN(v.price) >= ? AND MIN(v.price) <= ?"));
            assert!(sql.contains("LOWER(fv.fuel_type)"));
        }
        assert!(select.contains("LIMIT ? OFFSET ?"));
        assert!(!count.contains("LIMIT"));
    }

    #[test]
    fn test_project_value_keeps_requested_fields() {
        let value = json!({"id": "m1", "name": "Swift", "lowestPrice": 600000.0});
        let fields = vec!["id".to_string(), "lowestPrice".to_string()];

        let projected = project_value(value.clone(), Some(&fields)).unwrap();
        assert_eq!(projected, json!({"id": "m1", "lowestPrice": 600000.0}));

        assert_eq!(project_value(value.clone(), None).unwrap(), value);
    }
}
