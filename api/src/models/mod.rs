pub mod api_models;
pub mod server_models;
