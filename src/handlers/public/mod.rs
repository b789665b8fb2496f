// handlers/public/mod.rs - Endpoints that issue or create credentials
pub mod users;
