//! Data models for the `WindWatch` service

pub mod weather;

pub use weather::{ForecastDay, ForecastTimeframe, WeatherSnapshot, WindReading};
