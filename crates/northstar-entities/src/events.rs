//! `SeaORM` Entity for the events table

use northstar_core::DBDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "events")]
pub struct Model {
    /// Auto-increment key; doubles as the stable tiebreak for events sharing
    /// a timestamp (insertion order).
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub event_name: String,
    pub event_timestamp: DBDateTime,
    pub platform: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
