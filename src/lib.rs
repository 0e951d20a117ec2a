pub mod analytics;
pub mod dashboard;
pub mod load;
pub mod media;
pub mod messages;
pub mod notifications;
pub mod services;
pub mod table;
pub mod users;
