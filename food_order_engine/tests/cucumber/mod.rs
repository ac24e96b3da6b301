mod food_world;
mod steps;

pub use food_world::{FoodOrderSystem, FoodWorld};
