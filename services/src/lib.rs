pub mod catalog;
pub mod complaint;
pub mod lifecycle;
pub mod photo;
pub mod policy;
pub mod profile;
pub mod service;
pub mod unique_code;
pub mod user;
pub mod views;

#[cfg(test)]
mod test_support;
