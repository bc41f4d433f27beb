pub mod cli;
pub mod identity;
pub mod konfirmo;
pub mod otp;
