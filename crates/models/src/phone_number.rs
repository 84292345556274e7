use sea_orm::{entity::prelude::*, ActiveModelTrait, ConnectionTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};

use crate::{contact, errors};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "phone_number")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub number: String,
    pub contact_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Contact }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Contact => Entity::belongs_to(contact::Entity)
                .from(Column::ContactId)
                .to(contact::Column::Id)
                .on_delete(ForeignKeyAction::Cascade)
                .into(),
        }
    }
}

impl Related<contact::Entity> for Entity {
    fn to() -> RelationDef { Relation::Contact.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub const NUMBER_MAX_LEN: usize = 64;

pub fn validate_number(number: &str) -> Result<String, errors::ModelError> {
    let trimmed = number.trim();
    if trimmed.is_empty() {
        return Err(errors::ModelError::Validation("phone number must not be blank".into()));
    }
    if trimmed.len() > NUMBER_MAX_LEN {
        return Err(errors::ModelError::Validation(format!("phone number longer than {NUMBER_MAX_LEN} bytes")));
    }
    Ok(trimmed.to_string())
}

/// Insert `numbers` for `contact_id`, in order, returning the stored rows.
pub async fn create_many<C: ConnectionTrait>(
    db: &C,
    contact_id: i32,
    numbers: &[String],
) -> Result<Vec<Model>, errors::ModelError> {
    let mut created = Vec::with_capacity(numbers.len());
    for number in numbers {
        let am = ActiveModel {
            number: Set(validate_number(number)?),
            contact_id: Set(contact_id),
            ..Default::default()
        };
        created.push(am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))?);
    }
    Ok(created)
}

/// Remove every number owned by `contact_id`; returns the number of rows removed.
pub async fn delete_for_contact<C: ConnectionTrait>(db: &C, contact_id: i32) -> Result<u64, errors::ModelError> {
    let res = Entity::delete_many()
        .filter(Column::ContactId.eq(contact_id))
        .exec(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(res.rows_affected)
}

pub async fn list_for_contact<C: ConnectionTrait>(db: &C, contact_id: i32) -> Result<Vec<Model>, errors::ModelError> {
    Entity::find()
        .filter(Column::ContactId.eq(contact_id))
        .order_by_asc(Column::Id)
        .all(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}
