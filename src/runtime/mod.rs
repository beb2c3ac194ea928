//! Host-boundary runtime services

pub mod i18n;
