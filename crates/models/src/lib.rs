pub mod errors;
pub mod db;
pub mod contact;
pub mod phone_number;

#[cfg(test)]
mod tests;
