pub mod sma;

pub use sma::{moving_average, with_moving_averages, MaColumn, MaSeries};
