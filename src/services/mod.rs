pub mod address_service;
pub mod contact_service;
pub mod user_service;

pub use address_service::AddressService;
pub use contact_service::ContactService;
pub use user_service::UserService;
