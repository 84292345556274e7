use sea_orm::{entity::prelude::*, ActiveModelTrait, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

use crate::{errors, phone_number};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contact")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub image: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { PhoneNumber }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::PhoneNumber => Entity::has_many(phone_number::Entity).into(),
        }
    }
}

impl Related<phone_number::Entity> for Entity {
    fn to() -> RelationDef { Relation::PhoneNumber.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub const NAME_MAX_LEN: usize = 255;

/// Trim and bound a contact name.
pub fn validate_name(name: &str) -> Result<String, errors::ModelError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(errors::ModelError::Validation("name required".into()));
    }
    if trimmed.chars().count() > NAME_MAX_LEN {
        return Err(errors::ModelError::Validation(format!("name longer than {NAME_MAX_LEN} characters")));
    }
    Ok(trimmed.to_string())
}

/// Insert the header row. Works on a plain connection or inside a transaction.
pub async fn create<C: ConnectionTrait>(db: &C, name: &str, image: Option<String>) -> Result<Model, errors::ModelError> {
    let name = validate_name(name)?;
    let am = ActiveModel {
        name: Set(name),
        image: Set(image),
        ..Default::default()
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
