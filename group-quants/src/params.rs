mod asymmetric;
mod integer_symmetric;
mod symmetric;

pub use asymmetric::Asymmetric;
pub use integer_symmetric::IntegerSymmetric;
pub use symmetric::Symmetric;
