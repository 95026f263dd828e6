pub mod delivery;
pub mod device;
pub mod expo;
pub mod health;
pub mod request;
pub mod response;
pub mod status;
pub mod template;
pub mod validation;
