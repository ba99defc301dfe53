pub mod monte_carlo;

pub use monte_carlo::{run_forecast, run_forecast_parallel, ForecastSummary, SideForecast};
