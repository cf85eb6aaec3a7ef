pub mod post_service;
pub mod registration_service;
pub mod token_service;
pub mod user_service;
pub mod validation;
