pub use sea_orm_migration::prelude::*;

mod m20260825_000001_create_task_table;
mod m20260825_000002_add_user_id_index;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260825_000001_create_task_table::Migration),
            Box::new(m20260825_000002_add_user_id_index::Migration),
        ]
    }
}
