pub mod service;
pub mod types;

pub use service::InputsService;
pub use types::UserInputForm;
