pub mod geolocation;
pub mod persistence;
