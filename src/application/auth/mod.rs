pub mod cleanup;
pub mod login;
pub mod logout;
pub mod register;
pub mod rotate;
pub mod token_utils;
