use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::entities::team_member;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TeamMember {
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub image: String,
    #[serde(skip)]
    pub blob_key: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateTeamMember {
    pub name: String,
    pub role: String,
    pub image: String,
    pub blob_key: String,
}

impl TeamMember {
    fn from_model(model: team_member::Model) -> Self {
        Self {
            id: model.uuid,
            name: model.name,
            role: model.role,
            image: model.image,
            blob_key: model.blob_key,
            created_at: model.created_at.into(),
        }
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let records = team_member::Entity::find()
            .order_by_asc(team_member::Column::CreatedAt)
            .order_by_asc(team_member::Column::Id)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = team_member::Entity::find()
            .filter(team_member::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateTeamMember,
    ) -> Result<Self, DbErr> {
        let active = team_member::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            name: Set(data.name.clone()),
            role: Set(data.role.clone()),
            image: Set(data.image.clone()),
            blob_key: Set(data.blob_key.clone()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let Some(member) = Self::find_by_id(db, id).await? else {
            return Ok(None);
        };

        let result = team_member::Entity::delete_many()
            .filter(team_member::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Ok(None);
        }
        Ok(Some(member))
    }

    pub async fn blob_keys<C: ConnectionTrait>(db: &C) -> Result<Vec<String>, DbErr> {
        team_member::Entity::find()
            .select_only()
            .column(team_member::Column::BlobKey)
            .into_tuple()
            .all(db)
            .await
    }
}
