//! Brief Assist: a Telegram questionnaire bot that collects a project brief
//! and hands it to an operator.

pub mod bot;
pub mod catalog;
pub mod channels;
pub mod config;
pub mod conversation;
pub mod dispatch;
pub mod error;
pub mod routes;
pub mod session;
pub mod summary;
