/// JSON seed import for the dog catalog
use super::{DogCatalog, NewDog};
use crate::error::{AppError, AppResult};
use std::path::Path;
use validator::Validate;

/// Import a JSON array of dogs into an empty catalog.
///
/// Every entry is validated before anything is written, and the inserts share
/// one transaction: either the whole file lands or the catalog stays empty.
/// Returns the number of dogs imported; a non-empty catalog is left untouched.
pub async fn import_seed_file(catalog: &DogCatalog, path: &Path) -> AppResult<usize> {
    if catalog.count().await? > 0 {
        tracing::debug!("Dog catalog already populated, skipping seed import");
        return Ok(0);
    }

    let raw = tokio::fs::read_to_string(path).await?;
    let dogs: Vec<NewDog> = serde_json::from_str(&raw).map_err(|e| {
        AppError::Validation(format!("Invalid dog seed file {}: {}", path.display(), e))
    })?;

    for (index, dog) in dogs.iter().enumerate() {
        dog.validate().map_err(|e| {
            AppError::Validation(format!(
                "Invalid dog at index {} in seed file {}: {}",
                index,
                path.display(),
                e
            ))
        })?;
    }

    let mut tx = catalog.db.begin().await?;
    for dog in &dogs {
        DogCatalog::insert_dog(&mut *tx, dog).await?;
    }
    tx.commit().await?;

    let total = dogs.len();

    tracing::info!(count = total, path = %path.display(), "Imported dog catalog seed");
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::Size, db};
    use std::io::Write;

    const SEED: &str = r#"[
        {"name": "Francesca", "image_filename": "1.jpg", "breed": "Labrador", "age": 72, "gender": "f", "size": "l"},
        {"name": "Hank", "image_filename": "2.jpg", "breed": "French Bulldog", "age": 20, "gender": "m", "size": "s"},
        {"name": "Muffin", "image_filename": "3.jpg", "age": 6, "gender": "u", "size": "u"}
    ]"#;

    #[tokio::test]
    async fn test_import_into_empty_catalog() {
        let catalog = DogCatalog::new(db::test_pool().await);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SEED.as_bytes()).unwrap();

        let imported = import_seed_file(&catalog, file.path()).await.unwrap();
        assert_eq!(imported, 3);
        assert_eq!(catalog.count().await.unwrap(), 3);

        let muffin = catalog.get_dog(3).await.unwrap();
        assert_eq!(muffin.breed, "Unknown mix");
        assert_eq!(muffin.size, Size::Unknown);

        // Second run leaves the populated catalog alone
        let imported = import_seed_file(&catalog, file.path()).await.unwrap();
        assert_eq!(imported, 0);
        assert_eq!(catalog.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_import_rejects_malformed_file() {
        let catalog = DogCatalog::new(db::test_pool().await);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"[{"name": "Rex", "age": 3, "gender": "q", "size": "s"}]"#)
            .unwrap();

        let result = import_seed_file(&catalog, file.path()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_invalid_entry_leaves_catalog_empty() {
        let catalog = DogCatalog::new(db::test_pool().await);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"[
                {"name": "Rex", "age": 30, "gender": "m", "size": "l"},
                {"name": "", "age": 12, "gender": "f", "size": "s"}
            ]"#,
        )
        .unwrap();

        let result = import_seed_file(&catalog, file.path()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(catalog.count().await.unwrap(), 0);

        // A corrected file still imports in full on the next start
        let mut fixed = tempfile::NamedTempFile::new().unwrap();
        fixed.write_all(SEED.as_bytes()).unwrap();
        assert_eq!(import_seed_file(&catalog, fixed.path()).await.unwrap(), 3);
        assert_eq!(catalog.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_failed_insert_rolls_back_batch() {
        let pool = db::test_pool().await;
        let catalog = DogCatalog::new(pool.clone());
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SEED.as_bytes()).unwrap();

        // Reject the third insert at the storage layer
        sqlx::query(
            "CREATE TRIGGER reject_muffin BEFORE INSERT ON dog WHEN NEW.name = 'Muffin'
             BEGIN SELECT RAISE(ABORT, 'rejected'); END",
        )
        .execute(&pool)
        .await
        .unwrap();

        let result = import_seed_file(&catalog, file.path()).await;
        assert!(matches!(result, Err(AppError::Database(_))));
        assert_eq!(catalog.count().await.unwrap(), 0);
    }
}
