#![allow(dead_code)]

pub mod aclearn_env;
pub mod fake_backend;
pub mod npy;
