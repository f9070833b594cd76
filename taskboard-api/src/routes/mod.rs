/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `users`: Registration, login, and account management
/// - `projects`: Project CRUD and the visible-project listing
/// - `members`: Project membership management
/// - `tasks`: Task CRUD scoped to a project
/// - `comments`: Comment CRUD scoped to a task

pub mod comments;
pub mod health;
pub mod members;
pub mod projects;
pub mod tasks;
pub mod users;
