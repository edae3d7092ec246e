use sea_orm_migration::prelude::*;

mod m20250601_create_members_and_tasks;
mod m20250615_add_task_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_create_members_and_tasks::Migration),
            Box::new(m20250615_add_task_indexes::Migration),
        ]
    }
}
