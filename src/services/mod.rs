pub mod agenda;
pub mod mailer;
pub mod planner;
pub mod sqlite;
pub mod store;
