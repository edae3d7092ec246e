use crate::entities::{members, prelude::*, tasks};
use crate::models::member::{Member, MemberUpdate, NewMember};
use crate::models::now_timestamp;
use anyhow::Result;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;

pub struct MemberRepository {
    conn: DatabaseConnection,
}

impl MemberRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Case-insensitive, matching the ranking tie-break.
    fn name_nocase() -> SimpleExpr {
        Expr::cust("\"name\" COLLATE NOCASE")
    }

    fn map_model(model: members::Model) -> Member {
        Member {
            id: model.id,
            name: model.name,
            reg_number: model.reg_number,
            email: model.email,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    pub async fn add(&self, member: &NewMember) -> Result<Member> {
        let now = now_timestamp();
        let active_model = members::ActiveModel {
            name: Set(member.name.clone()),
            reg_number: Set(member.reg_number.clone()),
            email: Set(member.email.clone()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active_model.insert(&self.conn).await?;
        info!("Added member: {} ({})", model.name, model.reg_number);
        Ok(Self::map_model(model))
    }

    pub async fn get_by_reg_number(&self, reg_number: &str) -> Result<Option<Member>> {
        let result = Members::find()
            .filter(members::Column::RegNumber.eq(reg_number))
            .one(&self.conn)
            .await?;
        Ok(result.map(Self::map_model))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<Member>> {
        let result = Members::find()
            .filter(members::Column::Email.eq(email))
            .one(&self.conn)
            .await?;
        Ok(result.map(Self::map_model))
    }

    pub async fn list_alphabetical(&self) -> Result<Vec<Member>> {
        let rows = Members::find()
            .order_by_asc(Self::name_nocase())
            .order_by_asc(members::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn list_recent(&self, limit: u64) -> Result<Vec<Member>> {
        let rows = Members::find()
            .order_by_desc(members::Column::CreatedAt)
            .order_by_desc(members::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Member>> {
        let rows = Members::find()
            .filter(
                Condition::any()
                    .add(members::Column::Name.contains(query))
                    .add(members::Column::RegNumber.contains(query))
                    .add(members::Column::Email.contains(query)),
            )
            .order_by_asc(Self::name_nocase())
            .order_by_asc(members::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(Members::find().count(&self.conn).await?)
    }

    pub async fn update(&self, id: i32, update: &MemberUpdate) -> Result<Option<Member>> {
        let Some(model) = Members::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: members::ActiveModel = model.into();
        if let Some(name) = &update.name {
            active.name = Set(name.clone());
        }
        if let Some(email) = &update.email {
            active.email = Set(email.clone());
        }
        active.updated_at = Set(now_timestamp());

        let model = active.update(&self.conn).await?;
        Ok(Some(Self::map_model(model)))
    }

    /// Deletes the member together with every task it owns.
    pub async fn remove(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let tasks_removed = tasks::Entity::delete_many()
            .filter(tasks::Column::MemberId.eq(id))
            .exec(&txn)
            .await?;

        let result = Members::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        let removed = result.rows_affected > 0;
        if removed {
            info!(
                "Removed member {} and {} task(s)",
                id, tasks_removed.rows_affected
            );
        }
        Ok(removed)
    }

    /// Wipes both tables. Used by the sample data generator.
    pub async fn clear_all(&self) -> Result<()> {
        let txn = self.conn.begin().await?;
        tasks::Entity::delete_many().exec(&txn).await?;
        Members::delete_many().exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }
}
