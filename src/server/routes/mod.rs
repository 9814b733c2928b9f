pub mod google;
pub mod system;
