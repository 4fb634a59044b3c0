pub mod api_service;
pub mod http_service;
