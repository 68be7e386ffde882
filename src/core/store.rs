//! Store business logic - Tenants that scope every other record.

use crate::{
    entities::{Store, store},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Fetches a store or fails with [`Error::NotFound`].
///
/// Every store-scoped operation calls this first so a bad store id is reported as
/// "store not found" rather than as an empty result.
pub async fn ensure_store_exists<C>(db: &C, store_id: i64) -> Result<store::Model>
where
    C: ConnectionTrait,
{
    Store::find_by_id(store_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("store", store_id))
}

/// Creates a new store.
///
/// # Errors
/// Returns an error if the name is empty or the insert fails.
pub async fn create_store(db: &DatabaseConnection, name: &str) -> Result<store::Model> {
    if name.trim().is_empty() {
        return Err(Error::validation("Store name is required"));
    }

    let store = store::ActiveModel {
        name: Set(name.trim().to_string()),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };
    store.insert(db).await.map_err(Into::into)
}

/// Retrieves a store by id.
pub async fn get_store(db: &DatabaseConnection, store_id: i64) -> Result<store::Model> {
    ensure_store_exists(db, store_id).await
}

/// Lists all stores, oldest first.
pub async fn list_stores(db: &DatabaseConnection) -> Result<Vec<store::Model>> {
    Store::find()
        .order_by_asc(store::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_store_validation() {
        let db = setup_test_db().await.unwrap();
        let result = create_store(&db, "   ").await;
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[tokio::test]
    async fn test_create_and_list_stores() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_store(&db, "  Favobliss ").await?;
        let second = create_store(&db, "Outlet").await?;
        assert_eq!(first.name, "Favobliss");

        let stores = list_stores(&db).await?;
        assert_eq!(stores, vec![first, second]);
        Ok(())
    }

    #[tokio::test]
    async fn test_ensure_store_exists_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = ensure_store_exists(&db, 404).await;
        assert!(matches!(
            result,
            Err(Error::NotFound { entity: "store", .. })
        ));
        Ok(())
    }
}
