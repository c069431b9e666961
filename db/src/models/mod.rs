pub mod admin;
pub mod complaint;
pub mod complaint_response;
pub mod complaint_type;
pub mod course;
pub mod department;
pub mod personnel;
pub mod student;
pub mod user;

pub use admin::Entity as Admin;
pub use complaint::Entity as Complaint;
pub use complaint_response::Entity as ComplaintResponse;
pub use complaint_type::Entity as ComplaintType;
pub use course::Entity as Course;
pub use department::Entity as Department;
pub use personnel::Entity as Personnel;
pub use student::Entity as Student;
pub use user::Entity as User;
