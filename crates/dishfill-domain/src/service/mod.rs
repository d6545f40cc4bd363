//! Domain services

pub mod fill_aggregator;

pub use fill_aggregator::{
    round_percentage, weighted_overall, ClassifiedCounts, FillAggregator,
};
