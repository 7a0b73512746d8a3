pub mod delete_image;
pub mod health;
pub mod upload_image;
