pub mod binio;
pub mod boundary;
pub mod cli;
pub mod collision;
pub mod condensation;
pub mod config;
pub mod distributions;
pub mod driver;
pub mod equilibrium;
pub mod error;
pub mod gridbox;
pub mod gridboxmap;
pub mod idgen;
pub mod motion;
pub mod observer;
pub mod particle;
pub mod rng_pool;
pub mod scheduler;
pub mod sort;
pub mod store;
pub mod thermo;
pub mod transport;
