//! Typed Blogsite API calls

mod auth;
mod blogs;
mod categories;
