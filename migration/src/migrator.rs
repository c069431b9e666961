use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202601100001_create_users::Migration),
            Box::new(migrations::m202601100002_create_departments::Migration),
            Box::new(migrations::m202601100003_create_students::Migration),
            Box::new(migrations::m202601100004_create_personnel::Migration),
            Box::new(migrations::m202601100005_create_admins::Migration),
            Box::new(migrations::m202601100006_create_courses::Migration),
            Box::new(migrations::m202601100007_create_complaint_types::Migration),
            Box::new(migrations::m202601100008_create_complaints::Migration),
            Box::new(migrations::m202601100009_create_complaint_responses::Migration),
        ]
    }
}
