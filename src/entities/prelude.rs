pub use super::members::Entity as Members;
pub use super::tasks::Entity as Tasks;
