pub mod utils;

mod db;
mod stats;
