//! Core scene types

pub mod entity;
