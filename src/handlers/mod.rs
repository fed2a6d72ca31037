//! HTTP handlers

pub mod health;
pub mod form;
pub mod predict;
