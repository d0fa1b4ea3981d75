//! CLI command implementations

pub(crate) mod app;
pub(crate) mod common;
pub(crate) mod connection;
pub(crate) mod render;
pub(crate) mod sql;
pub(crate) mod streamlit;
