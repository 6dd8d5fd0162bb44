//! Terminal client for the NODO event calendar.
//!
//! Talks to the calendar REST backend: authentication, events, users, the
//! month calendar and the password-gated public view.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod forms;
pub mod i18n;
pub mod models;
pub mod pages;
pub mod render;
pub mod services;
