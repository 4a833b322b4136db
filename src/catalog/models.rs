use serde::{Deserialize, Serialize};

/// Publication status of a catalog record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Active,
    Inactive,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("active") {
            Self::Active
        } else {
            Self::Inactive
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub ranking: i64,
    #[serde(default)]
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarModel {
    pub id: String,
    pub brand_id: String,
    pub name: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub popular_rank: Option<i64>,
    #[serde(default)]
    pub new_rank: Option<i64>,
    #[serde(default)]
    pub body_type: Option<String>,
    #[serde(default)]
    pub launch_date: Option<String>,
    #[serde(default)]
    pub fuel_types: Vec<String>,
    #[serde(default)]
    pub transmissions: Vec<String>,
    #[serde(default)]
    pub hero_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: String,
    pub brand_id: String,
    pub model_id: String,
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub fuel_type: Option<String>,
    #[serde(default)]
    pub transmission: Option<String>,
}

/// A model joined with its brand and priced variants
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSummary {
    #[serde(flatten)]
    pub model: CarModel,
    pub brand_name: String,
    pub slug: String,
    /// 0 when the model has no priced variants
    pub lowest_price: f64,
    pub highest_price: f64,
    pub variant_count: i64,
    pub lowest_price_fuel_type: String,
}

/// Active model with its brand, as read for search indexing
#[derive(Debug, Clone, PartialEq)]
pub struct ModelWithBrand {
    pub id: String,
    pub name: String,
    pub brand_name: String,
    pub hero_image: Option<String>,
}

/// Search hit returned by both the in-memory index and the database fallback
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEntry {
    pub id: String,
    pub name: String,
    pub brand_name: String,
    pub brand_slug: String,
    pub model_slug: String,
    pub slug: String,
    pub hero_image: Option<String>,
}

impl From<ModelWithBrand> for SearchEntry {
    fn from(row: ModelWithBrand) -> Self {
        let brand_slug = slugify(&row.brand_name);
        let model_slug = slugify(&row.name);
        let slug = format!("{}-{}", brand_slug, model_slug);
        Self {
            id: row.id,
            name: row.name,
            brand_name: row.brand_name,
            brand_slug,
            model_slug,
            slug,
            hero_image: row.hero_image,
        }
    }
}

/// Batch of records loaded by `import`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogImport {
    #[serde(default)]
    pub brands: Vec<Brand>,
    #[serde(default)]
    pub models: Vec<CarModel>,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

/// Lower-case, whitespace runs become `-`
pub fn slugify(value: &str) -> String {
    value
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Slug of a model as used in URLs (`maruti-suzuki-swift`)
pub fn model_slug(brand_name: &str, model_name: &str) -> String {
    format!("{}-{}", slugify(brand_name), slugify(model_name))
}
