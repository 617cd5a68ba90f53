pub mod question;
pub mod test;
pub mod test_answer;
pub mod test_attempt;
pub mod user;
