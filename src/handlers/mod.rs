// src/handlers/mod.rs
pub mod chat;
pub mod debug;
pub mod mess;
