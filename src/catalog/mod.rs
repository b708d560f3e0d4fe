/// Dog catalog
///
/// Dog records, their gender/size code enumerations, and the administrative
/// create/read/update/delete operations plus the JSON seed import.

mod seed;

pub use seed::import_seed_file;

use crate::{
    error::{AppError, AppResult},
    preference::FilterCriteria,
};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqliteExecutor, SqlitePool};
use std::str::FromStr;
use validator::Validate;

/// Dog identifier, assigned monotonically by the store
pub type DogId = i64;

/// Dog gender codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "m")]
    Male,
    #[serde(rename = "f")]
    Female,
    #[serde(rename = "u")]
    Unknown,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "m",
            Gender::Female => "f",
            Gender::Unknown => "u",
        }
    }
}

impl FromStr for Gender {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "m" => Ok(Gender::Male),
            "f" => Ok(Gender::Female),
            "u" => Ok(Gender::Unknown),
            _ => Err(AppError::InvalidPreference(format!("Invalid gender code: {}", s))),
        }
    }
}

/// Dog size codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Size {
    #[serde(rename = "s")]
    Small,
    #[serde(rename = "m")]
    Medium,
    #[serde(rename = "l")]
    Large,
    #[serde(rename = "xl")]
    ExtraLarge,
    #[serde(rename = "u")]
    Unknown,
}

impl Size {
    #[cfg(test)]
    pub const ALL: [Size; 5] = [
        Size::Small,
        Size::Medium,
        Size::Large,
        Size::ExtraLarge,
        Size::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Size::Small => "s",
            Size::Medium => "m",
            Size::Large => "l",
            Size::ExtraLarge => "xl",
            Size::Unknown => "u",
        }
    }
}

impl FromStr for Size {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "s" => Ok(Size::Small),
            "m" => Ok(Size::Medium),
            "l" => Ok(Size::Large),
            "xl" => Ok(Size::ExtraLarge),
            "u" => Ok(Size::Unknown),
            _ => Err(AppError::InvalidPreference(format!("Invalid size code: {}", s))),
        }
    }
}

/// Dog record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dog {
    pub id: DogId,
    pub name: String,
    pub image_filename: String,
    pub breed: String,
    /// Age in months
    pub age: i64,
    pub gender: Gender,
    pub size: Size,
    pub neutered: Option<bool>,
}

/// Fields supplied when creating or editing a dog
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewDog {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub image_filename: String,
    #[serde(default = "default_breed")]
    #[validate(length(max = 255))]
    pub breed: String,
    #[validate(range(min = 0))]
    pub age: i64,
    pub gender: Gender,
    pub size: Size,
    #[serde(default)]
    pub neutered: Option<bool>,
}

/// `?, ?, ...` with `count` placeholders
fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn default_breed() -> String {
    "Unknown mix".to_string()
}

fn dog_from_row(row: &SqliteRow) -> AppResult<Dog> {
    let gender: String = row.get("gender");
    let size: String = row.get("size");

    Ok(Dog {
        id: row.get("id"),
        name: row.get("name"),
        image_filename: row.get("image_filename"),
        breed: row.get("breed"),
        age: row.get("age"),
        gender: gender
            .parse()
            .map_err(|_| AppError::Internal(format!("Corrupt gender code: {}", gender)))?,
        size: size
            .parse()
            .map_err(|_| AppError::Internal(format!("Corrupt size code: {}", size)))?,
        neutered: row.get("neutered"),
    })
}

/// Dog catalog manager
#[derive(Clone)]
pub struct DogCatalog {
    db: SqlitePool,
}

impl DogCatalog {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create a dog
    pub async fn create_dog(&self, dog: NewDog) -> AppResult<Dog> {
        dog.validate()?;

        let id = Self::insert_dog(&self.db, &dog).await?;

        tracing::info!(dog_id = id, name = %dog.name, "Dog created");

        Ok(Dog {
            id,
            name: dog.name,
            image_filename: dog.image_filename,
            breed: dog.breed,
            age: dog.age,
            gender: dog.gender,
            size: dog.size,
            neutered: dog.neutered,
        })
    }

    /// Insert an already validated dog on the caller's executor
    pub(crate) async fn insert_dog<'e, E>(executor: E, dog: &NewDog) -> AppResult<DogId>
    where
        E: SqliteExecutor<'e>,
    {
        let id = sqlx::query(
            r#"
            INSERT INTO dog (name, image_filename, breed, age, gender, size, neutered)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&dog.name)
        .bind(&dog.image_filename)
        .bind(&dog.breed)
        .bind(dog.age)
        .bind(dog.gender.as_str())
        .bind(dog.size.as_str())
        .bind(dog.neutered)
        .execute(executor)
        .await?
        .last_insert_rowid();

        Ok(id)
    }

    /// Get a dog by id
    pub async fn get_dog(&self, id: DogId) -> AppResult<Dog> {
        let row = sqlx::query(
            r#"
            SELECT id, name, image_filename, breed, age, gender, size, neutered
            FROM dog
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Dog {} not found", id)))?;

        dog_from_row(&row)
    }

    /// Replace the editable fields of a dog
    pub async fn update_dog(&self, id: DogId, dog: NewDog) -> AppResult<Dog> {
        dog.validate()?;

        let result = sqlx::query(
            r#"
            UPDATE dog
            SET name = ?, image_filename = ?, breed = ?, age = ?, gender = ?, size = ?, neutered = ?
            WHERE id = ?
            "#,
        )
        .bind(&dog.name)
        .bind(&dog.image_filename)
        .bind(&dog.breed)
        .bind(dog.age)
        .bind(dog.gender.as_str())
        .bind(dog.size.as_str())
        .bind(dog.neutered)
        .bind(id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Dog {} not found", id)));
        }

        self.get_dog(id).await
    }

    /// Delete a dog; its decisions go with it
    pub async fn delete_dog(&self, id: DogId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM dog WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Dog {} not found", id)));
        }

        tracing::info!(dog_id = id, "Dog deleted");
        Ok(())
    }

    /// Number of dogs in the catalog
    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dog")
            .fetch_one(&self.db)
            .await?;

        Ok(count)
    }

    /// Ids of dogs matching the criteria, ascending
    pub async fn matching_ids<'e, E>(executor: E, criteria: &FilterCriteria) -> AppResult<Vec<DogId>>
    where
        E: SqliteExecutor<'e>,
    {
        let spans = criteria.age_spans();
        if spans.is_empty() || criteria.genders.is_empty() || criteria.sizes.is_empty() {
            return Ok(Vec::new());
        }

        let age_condition = spans
            .iter()
            .map(|_| "(age >= ? AND age < ?)")
            .collect::<Vec<_>>()
            .join(" OR ");
        let conditions = [
            format!("({})", age_condition),
            format!("gender IN ({})", placeholders(criteria.genders.len())),
            format!("size IN ({})", placeholders(criteria.sizes.len())),
        ];
        let query_str = format!(
            "SELECT id FROM dog WHERE {} ORDER BY id",
            conditions.join(" AND ")
        );

        let mut query = sqlx::query_scalar::<_, DogId>(&query_str);
        for span in &spans {
            query = query.bind(span.start).bind(span.end);
        }
        for gender in &criteria.genders {
            query = query.bind(gender.as_str());
        }
        for size in &criteria.sizes {
            query = query.bind(size.as_str());
        }

        let ids = query.fetch_all(executor).await?;

        Ok(ids)
    }
}
