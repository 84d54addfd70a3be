pub mod cookies;
pub mod paths;
