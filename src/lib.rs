pub mod annotate;
pub mod api;
pub mod backtest_chart;
pub mod config;
pub mod demo;
pub mod http_client;
pub mod labels;
pub mod logging;
pub mod model;
pub mod path;
pub mod provider;
pub mod scale;
pub mod source;
pub mod state;
pub mod views;
pub mod window;
