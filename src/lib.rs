//! `mail2blog` — republish mailbox messages as static-site blog posts.
//!
//! This crate provides the core library: fetching a bounded batch of
//! messages, converting HTML bodies to Markdown with inline attachments
//! materialized as site assets, assembling front-matter-annotated post
//! files, and tracking deliveries so each message is published at most once.

pub mod config;
pub mod convert;
pub mod error;
pub mod ledger;
pub mod model;
pub mod post;
pub mod publish;
pub mod source;
