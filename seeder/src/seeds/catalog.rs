use crate::seed::Seeder;
use db::models::{complaint_type, course, department};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use services::service::AppError;

const DEPARTMENTS: &[(&str, &str, &[(&str, &str)])] = &[
    (
        "Computer Science",
        "CS",
        &[
            ("Data Structures and Algorithms", "COS212"),
            ("Software Engineering", "COS301"),
            ("Operating Systems", "COS226"),
        ],
    ),
    (
        "Mathematics",
        "MATH",
        &[("Linear Algebra", "WTW211"), ("Calculus", "WTW114")],
    ),
    (
        "Student Administration",
        "ADM",
        &[],
    ),
];

const TYPES: &[(&str, &str, bool)] = &[
    ("Academic", "Marks, lectures, assessments and course content", true),
    ("Facilities", "Buildings, equipment, cleanliness and safety", false),
    ("IT Services", "Network, accounts and lab computers", false),
    ("Administration", "Registration, fees and records", false),
];

/// Departments, their courses and the complaint categories. Skipped when departments
/// already exist.
pub struct CatalogSeeder;

#[async_trait::async_trait]
impl Seeder for CatalogSeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), AppError> {
        if department::Entity::find().count(db).await? > 0 {
            return Ok(());
        }

        for (name, code, courses) in DEPARTMENTS {
            let dept = department::Model::create(db, name, code, None).await?;
            for (course_name, course_code) in *courses {
                course::Model::create(db, course_name, course_code, dept.id).await?;
            }
        }

        for (name, description, requires_course) in TYPES {
            complaint_type::Model::create(db, name, Some(*description), *requires_course).await?;
        }
        Ok(())
    }
}
