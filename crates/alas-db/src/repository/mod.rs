pub mod devices;
pub mod jobs;
pub mod sessions;

pub use devices::Device;
pub use sessions::Session;
