//! A small `{red, blue}` pair, used everywhere a quantity is tracked
//! separately per warring coalition (resources, support counts, goal nodes).

use serde::{Deserialize, Serialize};

use crate::core::types::Coalition;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PerCoalition<T> {
    pub red: T,
    pub blue: T,
}

impl<T> PerCoalition<T> {
    pub fn new(red: T, blue: T) -> Self {
        Self { red, blue }
    }

    pub fn get(&self, c: Coalition) -> &T {
        match c {
            Coalition::Red => &self.red,
            Coalition::Blue => &self.blue,
            Coalition::Neutral => unreachable!("neutral has no per-coalition value"),
        }
    }

    pub fn get_mut(&mut self, c: Coalition) -> &mut T {
        match c {
            Coalition::Red => &mut self.red,
            Coalition::Blue => &mut self.blue,
            Coalition::Neutral => unreachable!("neutral has no per-coalition value"),
        }
    }

    pub fn set(&mut self, c: Coalition, value: T) {
        *self.get_mut(c) = value;
    }
}

impl<T: Default> Default for PerCoalition<T> {
    fn default() -> Self {
        Self {
            red: T::default(),
            blue: T::default(),
        }
    }
}
