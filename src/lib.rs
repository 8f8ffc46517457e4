pub mod captions;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod fit;
pub mod registry;
pub mod surface;
pub mod tasks {
    pub mod driver;
    pub mod headless;
}
