pub mod m202601100001_create_users;
pub mod m202601100002_create_departments;
pub mod m202601100003_create_students;
pub mod m202601100004_create_personnel;
pub mod m202601100005_create_admins;
pub mod m202601100006_create_courses;
pub mod m202601100007_create_complaint_types;
pub mod m202601100008_create_complaints;
pub mod m202601100009_create_complaint_responses;
