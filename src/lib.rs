pub mod config;
pub mod delay;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod geo;
pub mod gtfs;
pub mod output;
pub mod parser;
pub mod reports;
pub mod service;
pub mod state;
pub mod stats;
pub mod storage;

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}
