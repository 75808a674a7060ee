use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::entities::gallery_image;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct GalleryImage {
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    pub url: String,
    pub title: String,
    #[serde(skip)]
    pub blob_key: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateGalleryImage {
    pub url: String,
    pub title: String,
    pub blob_key: String,
}

impl GalleryImage {
    fn from_model(model: gallery_image::Model) -> Self {
        Self {
            id: model.uuid,
            url: model.url,
            title: model.title,
            blob_key: model.blob_key,
            created_at: model.created_at.into(),
        }
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let records = gallery_image::Entity::find()
            .order_by_asc(gallery_image::Column::CreatedAt)
            .order_by_asc(gallery_image::Column::Id)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = gallery_image::Entity::find()
            .filter(gallery_image::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateGalleryImage,
    ) -> Result<Self, DbErr> {
        let active = gallery_image::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            url: Set(data.url.clone()),
            title: Set(data.title.clone()),
            blob_key: Set(data.blob_key.clone()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    /// Removes the record and hands it back, or `None` when no record with
    /// this id existed (or a concurrent request removed it first).
    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let Some(image) = Self::find_by_id(db, id).await? else {
            return Ok(None);
        };

        let result = gallery_image::Entity::delete_many()
            .filter(gallery_image::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Ok(None);
        }
        Ok(Some(image))
    }

    pub async fn blob_keys<C: ConnectionTrait>(db: &C) -> Result<Vec<String>, DbErr> {
        gallery_image::Entity::find()
            .select_only()
            .column(gallery_image::Column::BlobKey)
            .into_tuple()
            .all(db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{Database, TransactionTrait};
    use sea_orm_migration::MigratorTrait;

    use super::*;

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    fn sample(name: &str) -> CreateGalleryImage {
        CreateGalleryImage {
            url: format!("/uploads/gallery/{name}"),
            title: format!("Title {name}"),
            blob_key: format!("gallery/{name}"),
        }
    }

    #[tokio::test]
    async fn create_then_list_in_insertion_order() {
        let db = setup_db().await;

        let first = GalleryImage::create(&db, &sample("a.jpg")).await.unwrap();
        let second = GalleryImage::create(&db, &sample("b.png")).await.unwrap();
        assert_ne!(first.id, second.id);

        let all = GalleryImage::find_all(&db).await.unwrap();
        let ids: Vec<Uuid> = all.iter().map(|image| image.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
        assert_eq!(all[1].blob_key, "gallery/b.png");
    }

    #[tokio::test]
    async fn delete_returns_removed_record_once() {
        let db = setup_db().await;
        let image = GalleryImage::create(&db, &sample("a.jpg")).await.unwrap();

        let removed = GalleryImage::delete(&db, image.id).await.unwrap();
        assert_eq!(removed.map(|r| r.blob_key), Some("gallery/a.jpg".to_string()));

        assert!(GalleryImage::delete(&db, image.id).await.unwrap().is_none());
        assert!(GalleryImage::find_all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_unknown_id_is_none() {
        let db = setup_db().await;
        GalleryImage::create(&db, &sample("a.jpg")).await.unwrap();

        assert!(GalleryImage::delete(&db, Uuid::new_v4()).await.unwrap().is_none());
        assert_eq!(GalleryImage::find_all(&db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rolled_back_transaction_leaves_no_records() {
        let db = setup_db().await;

        let tx = db.begin().await.unwrap();
        GalleryImage::create(&tx, &sample("a.jpg")).await.unwrap();
        GalleryImage::create(&tx, &sample("b.jpg")).await.unwrap();
        tx.rollback().await.unwrap();

        assert!(GalleryImage::find_all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blob_keys_lists_every_record() {
        let db = setup_db().await;
        GalleryImage::create(&db, &sample("a.jpg")).await.unwrap();
        GalleryImage::create(&db, &sample("b.gif")).await.unwrap();

        let mut keys = GalleryImage::blob_keys(&db).await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["gallery/a.jpg", "gallery/b.gif"]);
    }

    #[test]
    fn serializes_id_as_underscore_id_and_hides_blob_key() {
        let image = GalleryImage {
            id: Uuid::nil(),
            url: "/uploads/gallery/a.jpg".to_string(),
            title: "A".to_string(),
            blob_key: "gallery/a.jpg".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&image).unwrap();
        assert_eq!(json["_id"], Uuid::nil().to_string());
        assert!(json.get("id").is_none());
        assert!(json.get("blob_key").is_none());
    }
}
